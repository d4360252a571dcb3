//! Cryptosystème de Paillier : génération de clés, chiffrement,
//! déchiffrement, addition homomorphique de chiffrés et multiplication
//! d'un chiffré par un scalaire clair.
//!
//! ```no_run
//! use paillier_crypto::{KeyPair, Plaintext, Variant};
//!
//! let kp = KeyPair::new(2048, Variant::Full)?;
//! let (pk, sk) = (kp.public_key(), kp.private_key());
//!
//! let c1 = pk.encrypt(&Plaintext::from(5u32))?;
//! let c2 = pk.encrypt(&Plaintext::from(2u32))?;
//! assert_eq!(sk.decrypt(&pk.addition(&[c1.clone(), c2])?)?, Plaintext::from(7u32));
//! assert_eq!(sk.decrypt(&pk.multiply(&c1, &Plaintext::from(2u32))?)?, Plaintext::from(10u32));
//! # Ok::<(), paillier_crypto::CryptoError>(())
//! ```

// Déclaration des modules
pub mod crypto_error;
pub mod paillier;
pub mod key_management;

pub use crate::paillier::math;
pub use crate::paillier::p_keygen;
pub use crate::paillier::p_encrypt;
pub use crate::paillier::p_decrypt;
pub use crate::paillier::p_message;

// Fonctions mathématiques principales
pub use crate::paillier::math::{l_function, gcd, lcm, mod_inverse, get_generator};

// Types des clés et des messages
pub use crate::paillier::{KeyGenConfig, KeyPair, PrivateKey, PublicKey, Variant};
pub use crate::paillier::{Ciphertext, Plaintext};

// Erreur centralisée
pub use crypto_error::CryptoError;
