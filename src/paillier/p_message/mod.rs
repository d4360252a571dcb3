pub mod p_message;

pub use p_message::{Ciphertext, Plaintext};
