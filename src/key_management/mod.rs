pub mod key_storage;

pub use key_storage::{
    PublicKeyJson, PrivateKeyJson, KeyPairJson,
    biguint_to_hex, hex_to_biguint, biguint_to_decimal, decimal_to_biguint,
    public_key_to_json, private_key_to_json, keypair_to_json,
    json_to_public_key, json_to_keypair,
    save_keypair_json, save_public_key_json,
    load_keypair_json, load_public_key_json,
    key_file_exists, ensure_keys_directory,
};
