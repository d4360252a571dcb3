use num_bigint::BigUint;
use num_traits::One;
use rand_core::{CryptoRng, OsRng, RngCore};
use crate::crypto_error::CryptoError;
use crate::paillier::math::{gcd, random_below};
use crate::paillier::p_keygen::PublicKey;
use crate::paillier::p_message::{Ciphertext, Plaintext};

// Un r hors de Z*_n sort avec probabilité ~ (p+q)/n : 128 échecs d'affilée
// ne s'expliquent que par une source d'aléa dégénérée.
const MAX_BLINDING_DRAWS: u32 = 128;

impl PublicKey {
    // -----------------------------------------------------------------------
    // Chiffrement Paillier : c = g^m · r^n  mod n²
    //
    // r est retiré à chaque appel : deux chiffrés du même clair diffèrent.
    // Un clair >= n est rejeté (InvalidPlaintext), jamais réduit en silence ;
    // voir Plaintext::reduced pour la réduction explicite.
    // -----------------------------------------------------------------------
    pub fn encrypt(&self, m: &Plaintext) -> Result<Ciphertext, CryptoError> {
        self.encrypt_with_rng(m, &mut OsRng)
    }

    pub fn encrypt_with_rng<R: RngCore + CryptoRng>(
        &self,
        m: &Plaintext,
        rng: &mut R,
    ) -> Result<Ciphertext, CryptoError> {
        let m = m.as_biguint();
        if m >= self.n() {
            return Err(CryptoError::InvalidPlaintext);
        }

        let r   = self.draw_blinding(rng)?;
        let g_m = self.g_pow(m);
        let r_n = r.modpow(self.n(), self.n_squared());

        Ok(Ciphertext::new((g_m * r_n) % self.n_squared()))
    }

    // -----------------------------------------------------------------------
    // Addition homomorphique : E(m1)·…·E(mk) mod n² = E(m1 + … + mk mod n)
    // -----------------------------------------------------------------------
    pub fn addition(&self, ciphertexts: &[Ciphertext]) -> Result<Ciphertext, CryptoError> {
        if ciphertexts.is_empty() {
            return Err(CryptoError::InvalidParameter(
                "l'addition homomorphique demande au moins un chiffré".to_string(),
            ));
        }

        ciphertexts
            .iter()
            .try_fold(BigUint::one(), |acc, c| -> Result<BigUint, CryptoError> {
                self.check_ciphertext(c)?;
                Ok((acc * c.as_biguint()) % self.n_squared())
            })
            .map(Ciphertext::new)
    }

    // -----------------------------------------------------------------------
    // Multiplication pseudo-homomorphique : E(m)^k mod n² = E(k·m mod n)
    //
    // Un seul opérande chiffré : le scalaire k est un clair.
    // -----------------------------------------------------------------------
    pub fn multiply(&self, c: &Ciphertext, k: &Plaintext) -> Result<Ciphertext, CryptoError> {
        self.check_ciphertext(c)?;
        if k.as_biguint() >= self.n() {
            return Err(CryptoError::InvalidPlaintext);
        }
        Ok(Ciphertext::new(c.as_biguint().modpow(k.as_biguint(), self.n_squared())))
    }

    pub(crate) fn check_ciphertext(&self, c: &Ciphertext) -> Result<(), CryptoError> {
        if c.as_biguint() >= self.n_squared() {
            return Err(CryptoError::InvalidCiphertext);
        }
        Ok(())
    }

    // r uniforme dans (1, n) avec gcd(r, n) = 1
    fn draw_blinding<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<BigUint, CryptoError> {
        for _ in 0..MAX_BLINDING_DRAWS {
            let r = random_below(self.n(), rng)?;
            if r > BigUint::one() && gcd(&r, self.n()).is_one() {
                return Ok(r);
            }
        }
        Err(CryptoError::RandomnessUnavailable(format!(
            "aucun r valide dans Z*_n après {MAX_BLINDING_DRAWS} tirages"
        )))
    }

    // g = n+1 (variante simple) : (n+1)^m mod n² = 1 + m·n, sans modpow
    fn g_pow(&self, m: &BigUint) -> BigUint {
        if self.g_is_n_plus_one() {
            return (BigUint::one() + m * self.n()) % self.n_squared();
        }
        self.g().modpow(m, self.n_squared())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paillier::math::random::test_rng::{ConstantRng, FailingRng};
    use crate::paillier::p_keygen::{KeyGenConfig, KeyPair, Variant};
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    use rstest::rstest;

    fn keypair(bits: u64, variant: Variant, seed: u64) -> KeyPair {
        KeyPair::generate_with_rng(&KeyGenConfig::new(bits, variant), &mut ChaCha20Rng::seed_from_u64(seed)).unwrap()
    }

    #[rstest]
    fn test_additive_homomorphism(#[values(Variant::Simple, Variant::Full)] variant: Variant) {
        let kp = keypair(256, variant, 21);
        let (pk, sk) = (kp.public_key(), kp.private_key());
        let mut rng = ChaCha20Rng::seed_from_u64(22);

        let messages: Vec<BigUint> = (0..32).map(|_| random_below(pk.n(), &mut rng).unwrap()).collect();
        let ciphertexts: Vec<Ciphertext> = messages
            .iter()
            .map(|m| pk.encrypt_with_rng(&Plaintext::new(m.clone()), &mut rng).unwrap())
            .collect();

        let expected = messages.iter().fold(BigUint::from(0u32), |acc, m| (acc + m) % pk.n());
        let sum = pk.addition(&ciphertexts).unwrap();
        assert!(sum.as_biguint() < pk.n_squared());
        assert_eq!(sk.decrypt(&sum).unwrap(), Plaintext::new(expected));
    }

    #[test]
    fn test_addition_of_single_ciphertext_is_identity() {
        let kp = keypair(128, Variant::Full, 23);
        let c = kp.public_key().encrypt(&Plaintext::from(42u32)).unwrap();
        assert_eq!(kp.public_key().addition(std::slice::from_ref(&c)).unwrap(), c);
    }

    #[rstest]
    fn test_scalar_multiplication(#[values(Variant::Simple, Variant::Full)] variant: Variant) {
        let kp = keypair(256, variant, 24);
        let (pk, sk) = (kp.public_key(), kp.private_key());
        let mut rng = ChaCha20Rng::seed_from_u64(25);

        for _ in 0..16 {
            let m = random_below(pk.n(), &mut rng).unwrap();
            let k = random_below(pk.n(), &mut rng).unwrap();
            let c = pk.encrypt_with_rng(&Plaintext::new(m.clone()), &mut rng).unwrap();
            let scaled = pk.multiply(&c, &Plaintext::new(k.clone())).unwrap();
            assert_eq!(sk.decrypt(&scaled).unwrap(), Plaintext::new((k * m) % pk.n()));
        }
    }

    #[test]
    fn test_encryption_is_probabilistic() {
        let kp = keypair(256, Variant::Full, 26);
        let (pk, sk) = (kp.public_key(), kp.private_key());
        let m = Plaintext::from(1234u32);

        let c1 = pk.encrypt(&m).unwrap();
        let c2 = pk.encrypt(&m).unwrap();
        assert_ne!(c1, c2);
        assert_eq!(sk.decrypt(&c1).unwrap(), m);
        assert_eq!(sk.decrypt(&c2).unwrap(), m);
    }

    #[test]
    fn test_simple_variant_shortcut_matches_modpow() {
        let kp = keypair(128, Variant::Simple, 27);
        let pk = kp.public_key();
        let m = BigUint::from(987_654_321u64);
        assert!(pk.g_is_n_plus_one());
        assert_eq!(pk.g_pow(&m), pk.g().modpow(&m, pk.n_squared()));
    }

    #[test]
    fn test_out_of_range_inputs_rejected() {
        let kp = keypair(64, Variant::Full, 28);
        let pk = kp.public_key();
        let too_big_m = Plaintext::new(pk.n().clone());
        let too_big_c = Ciphertext::new(pk.n_squared().clone());
        let valid_c = pk.encrypt(&Plaintext::from(1u32)).unwrap();

        assert_eq!(pk.encrypt(&too_big_m), Err(CryptoError::InvalidPlaintext));
        assert_eq!(pk.multiply(&valid_c, &too_big_m), Err(CryptoError::InvalidPlaintext));
        assert_eq!(pk.multiply(&too_big_c, &Plaintext::from(2u32)), Err(CryptoError::InvalidCiphertext));
        assert_eq!(pk.addition(&[valid_c, too_big_c]), Err(CryptoError::InvalidCiphertext));
        assert!(matches!(pk.addition(&[]), Err(CryptoError::InvalidParameter(_))));
    }

    #[test]
    fn test_blinding_failures_surface() {
        let kp = keypair(64, Variant::Full, 29);
        let pk = kp.public_key();
        let m = Plaintext::from(5u32);

        // Octets nuls : r = 0 à chaque tirage
        assert!(matches!(
            pk.encrypt_with_rng(&m, &mut ConstantRng(0)),
            Err(CryptoError::RandomnessUnavailable(_))
        ));
        assert!(matches!(
            pk.encrypt_with_rng(&m, &mut FailingRng),
            Err(CryptoError::RandomnessUnavailable(_))
        ));
    }
}
