pub mod math;
pub mod p_decrypt;
pub mod p_encrypt;
pub mod p_keygen;
pub mod p_message;

pub use p_keygen::{KeyGenConfig, KeyPair, PrivateKey, PublicKey, Variant};
pub use p_message::{Ciphertext, Plaintext};
