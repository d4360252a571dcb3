pub mod p_decrypt;
