use crate::crypto_error::CryptoError;
use crate::paillier::math::l_function;
use crate::paillier::p_keygen::PrivateKey;
use crate::paillier::p_message::{Ciphertext, Plaintext};

impl PrivateKey {
    // -----------------------------------------------------------------------
    // Déchiffrement Paillier : m = L(c^lambda mod n²) · mu  mod n
    //
    // Seuls lambda, mu et (n, n²) de la clé publique interviennent.
    // -----------------------------------------------------------------------
    pub fn decrypt(&self, c: &Ciphertext) -> Result<Plaintext, CryptoError> {
        let pk = self.public_key();
        pk.check_ciphertext(c)?;

        let c_lambda   = c.as_biguint().modpow(self.lambda(), pk.n_squared());
        let l_c_lambda = l_function(&c_lambda, pk.n());

        Ok(Plaintext::new((l_c_lambda * self.mu()) % pk.n()))
    }
}
