use std::fmt;
use serde::{Deserialize, Serialize};
use crate::crypto_error::CryptoError;
use crate::paillier::math::{MAX_MODULUS_BITS, MIN_MODULUS_BITS};

/// Dérivation du générateur g et de lambda.
///
/// Les deux variantes ne sont pas un simple interrupteur :
///
/// - `Simple` : g = n+1, lambda = phi = (p-1)(q-1), mu = lambda⁻¹ mod n.
///   Aucun modpow sur n² à la génération. Valide parce que p et q ont la même
///   taille, ce qui garantit gcd(n, phi) = 1.
/// - `Full` : g = (alpha·n + 1)·beta^n mod n² avec alpha, beta aléatoires,
///   lambda = lcm(p-1, q-1), mu = L(g^lambda mod n², n)⁻¹ mod n.
///   Un modpow sur n² de plus à la génération, g n'est pas structurellement
///   prévisible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Simple,
    #[default]
    Full,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Simple => write!(f, "simple"),
            Variant::Full   => write!(f, "full"),
        }
    }
}

/// Paramètres de génération d'une paire de clés.
///
/// Les champs absents d'un document JSON prennent leur valeur par défaut.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyGenConfig {
    /// Taille exacte de n en bits (paire, >= 8 ; 2048+ en production)
    pub bit_length: u64,
    pub variant: Variant,
    /// Budget de tirages (p, q) complets avant PrimeSearchExhausted
    pub max_attempts: u32,
    /// Budget de tirages de g (variante full) avant InvariantViolation
    pub max_generator_attempts: u32,
}

impl Default for KeyGenConfig {
    fn default() -> Self {
        KeyGenConfig {
            bit_length:             2048,
            variant:                Variant::Full,
            max_attempts:           1000,
            max_generator_attempts: 16,
        }
    }
}

impl KeyGenConfig {
    pub fn new(bit_length: u64, variant: Variant) -> Self {
        KeyGenConfig { bit_length, variant, ..Self::default() }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_max_generator_attempts(mut self, max_generator_attempts: u32) -> Self {
        self.max_generator_attempts = max_generator_attempts;
        self
    }

    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.bit_length < MIN_MODULUS_BITS {
            return Err(CryptoError::InvalidParameter(format!(
                "taille de module {} bits insuffisante, minimum requis : {MIN_MODULUS_BITS} bits",
                self.bit_length
            )));
        }
        if self.bit_length > MAX_MODULUS_BITS {
            return Err(CryptoError::InvalidParameter(format!(
                "taille de module {} bits excessive, maximum accepté : {MAX_MODULUS_BITS} bits",
                self.bit_length
            )));
        }
        if self.bit_length % 2 != 0 {
            return Err(CryptoError::InvalidParameter(format!(
                "taille de module {} bits impaire : p et q doivent avoir la même taille",
                self.bit_length
            )));
        }
        if self.max_attempts == 0 || self.max_generator_attempts == 0 {
            return Err(CryptoError::InvalidParameter(
                "budget de tentatives nul".to_string(),
            ));
        }
        Ok(())
    }

    /// Lit et valide une configuration JSON.
    pub fn from_json(raw: &str) -> Result<Self, CryptoError> {
        let config: KeyGenConfig = serde_json::from_str(raw)
            .map_err(|e| CryptoError::InvalidParameter(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
