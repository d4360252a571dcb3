use std::fmt;
use num_bigint::BigUint;
use crate::paillier::p_keygen::PublicKey;

// ============================================================================
// Clair et chiffré — deux types distincts pour deux domaines distincts
//
// Un clair vit dans [0, n), un chiffré dans [0, n²). Les deux enveloppent un
// BigUint mais aucune conversion de l'un vers l'autre n'existe : passer un
// chiffré là où un clair est attendu ne compile pas.
//
// Aucune vérification de plage à la construction (la clé n'est pas connue) :
// encrypt / multiply / addition / decrypt vérifient contre la clé utilisée.
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Plaintext(BigUint);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ciphertext(BigUint);

impl Plaintext {
    pub fn new(value: BigUint) -> Self {
        Plaintext(value)
    }

    /// Réduction explicite modulo n.
    ///
    /// `encrypt` rejette les clairs hors de [0, n) ; l'appelant qui veut la
    /// réduction automatique la demande ici.
    pub fn reduced(value: &BigUint, pk: &PublicKey) -> Self {
        Plaintext(value % pk.n())
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn into_inner(self) -> BigUint {
        self.0
    }

    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }

    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Plaintext(BigUint::from_bytes_be(bytes))
    }
}

impl Ciphertext {
    pub fn new(value: BigUint) -> Self {
        Ciphertext(value)
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn into_inner(self) -> BigUint {
        self.0
    }

    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }

    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Ciphertext(BigUint::from_bytes_be(bytes))
    }
}

impl From<BigUint> for Plaintext {
    fn from(value: BigUint) -> Self {
        Plaintext(value)
    }
}

impl From<u64> for Plaintext {
    fn from(value: u64) -> Self {
        Plaintext(BigUint::from(value))
    }
}

impl From<u32> for Plaintext {
    fn from(value: u32) -> Self {
        Plaintext(BigUint::from(value))
    }
}

impl From<BigUint> for Ciphertext {
    fn from(value: BigUint) -> Self {
        Ciphertext(value)
    }
}

impl fmt::Display for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
