pub mod config;
pub mod p_keygen;

pub use config::{KeyGenConfig, Variant};
pub use p_keygen::{KeyPair, PrivateKey, PublicKey};
