use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use num_bigint::BigUint;
use num_traits::Num;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;
use crate::crypto_error::CryptoError;
use crate::paillier::math::MAX_MODULUS_BITS;
use crate::paillier::p_keygen::{KeyPair, PrivateKey, PublicKey};

// ============================================================================
// Protection DoS parsing — limites de taille des entrées
//
// from_str_radix est quadratique en la longueur de l'entrée : les longueurs
// sont vérifiées AVANT toute conversion, la taille du fichier AVANT lecture.
// Dimensionnées pour des modules jusqu'à MAX_MODULUS_BITS (16384) bits ;
// g (variante full) vit dans [0, n²) et peut donc atteindre 32768 bits.
// ============================================================================

/// Taille maximale d'un fichier de clés JSON en octets
const MAX_KEY_FILE_BYTES: u64 = 32_768;

/// 32768 bits = 8192 caractères hex
const MAX_HEX_FIELD_LEN: usize = (2 * MAX_MODULUS_BITS / 4) as usize;

/// 32768 bits ≈ 9865 chiffres décimaux
const MAX_DECIMAL_FIELD_LEN: usize = 9_866;

// ============================================================================
// Structures JSON — champs en hexadécimal majuscule
//
// n² n'est jamais stocké : PublicKey::new le recalcule au chargement.
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicKeyJson {
    pub n: String,
    pub g: String,
}

#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct PrivateKeyJson {
    pub lambda: String,
    pub mu:     String,
    pub p:      String,
    pub q:      String,
}

impl Drop for PrivateKeyJson {
    fn drop(&mut self) {
        self.lambda.zeroize();
        self.mu.zeroize();
        self.p.zeroize();
        self.q.zeroize();
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct KeyPairJson {
    pub public_key:  PublicKeyJson,
    pub private_key: PrivateKeyJson,
}

// ============================================================================
// Conversions BigUint ↔ texte
// ============================================================================

pub fn biguint_to_hex(value: &BigUint) -> String {
    value.to_str_radix(16).to_uppercase()
}

pub fn hex_to_biguint(hex_str: &str) -> Result<BigUint, CryptoError> {
    parse_bounded(hex_str, 16, MAX_HEX_FIELD_LEN)
}

pub fn biguint_to_decimal(value: &BigUint) -> String {
    value.to_str_radix(10)
}

pub fn decimal_to_biguint(dec_str: &str) -> Result<BigUint, CryptoError> {
    parse_bounded(dec_str, 10, MAX_DECIMAL_FIELD_LEN)
}

fn parse_bounded(raw: &str, radix: u32, maximum: usize) -> Result<BigUint, CryptoError> {
    if raw.len() > maximum {
        return Err(CryptoError::HexFieldTooLong { actual: raw.len(), maximum });
    }
    BigUint::from_str_radix(raw, radix).map_err(|_| CryptoError::HexParseError)
}

// ============================================================================
// Clés → JSON
// ============================================================================

pub fn public_key_to_json(pk: &PublicKey) -> PublicKeyJson {
    PublicKeyJson {
        n: biguint_to_hex(pk.n()),
        g: biguint_to_hex(pk.g()),
    }
}

pub fn private_key_to_json(sk: &PrivateKey) -> PrivateKeyJson {
    PrivateKeyJson {
        lambda: biguint_to_hex(sk.lambda()),
        mu:     biguint_to_hex(sk.mu()),
        p:      biguint_to_hex(sk.p()),
        q:      biguint_to_hex(sk.q()),
    }
}

pub fn keypair_to_json(kp: &KeyPair) -> KeyPairJson {
    KeyPairJson {
        public_key:  public_key_to_json(kp.public_key()),
        private_key: private_key_to_json(kp.private_key()),
    }
}

// ============================================================================
// JSON → clés
// PublicKey::new et PrivateKey::new refont les contrôles de cohérence :
// g dans [1, n²), p·q == n. check_coherence vérifie ensuite lambda et mu.
// ============================================================================

pub fn json_to_public_key(json: &PublicKeyJson) -> Result<PublicKey, CryptoError> {
    PublicKey::new(hex_to_biguint(&json.n)?, hex_to_biguint(&json.g)?)
}

pub fn json_to_keypair(json: &KeyPairJson) -> Result<KeyPair, CryptoError> {
    let public_key = Arc::new(json_to_public_key(&json.public_key)?);
    let private_key = PrivateKey::new(
        hex_to_biguint(&json.private_key.lambda)?,
        hex_to_biguint(&json.private_key.mu)?,
        hex_to_biguint(&json.private_key.p)?,
        hex_to_biguint(&json.private_key.q)?,
        public_key,
    )?;
    private_key.check_coherence()?;
    Ok(KeyPair::from_parts(private_key))
}

// ============================================================================
// Fichiers
// ============================================================================

fn check_file_size(path: &Path) -> io::Result<()> {
    let meta = fs::metadata(path)?;
    if meta.len() > MAX_KEY_FILE_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Fichier de clés trop grand : {} octets (maximum autorisé : {} octets)",
                meta.len(),
                MAX_KEY_FILE_BYTES
            ),
        ));
    }
    Ok(())
}

fn invalid_data(e: CryptoError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

pub fn save_keypair_json(kp: &KeyPair, path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(&keypair_to_json(kp))?;
    fs::write(path, json)
}

pub fn save_public_key_json(pk: &PublicKey, path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(&public_key_to_json(pk))?;
    fs::write(path, json)
}

pub fn load_keypair_json(path: impl AsRef<Path>) -> io::Result<KeyPair> {
    let path = path.as_ref();
    check_file_size(path)?;
    let raw = fs::read_to_string(path)?;
    let json: KeyPairJson = serde_json::from_str(&raw)?;
    json_to_keypair(&json).map_err(invalid_data)
}

pub fn load_public_key_json(path: impl AsRef<Path>) -> io::Result<PublicKey> {
    let path = path.as_ref();
    check_file_size(path)?;
    let raw = fs::read_to_string(path)?;
    let json: PublicKeyJson = serde_json::from_str(&raw)?;
    json_to_public_key(&json).map_err(invalid_data)
}

pub fn key_file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

pub fn ensure_keys_directory(dir: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(dir)
}
