// =========================================================
// Démonstration — Cryptosystème de Paillier
// Variantes full / simple, addition et multiplication homomorphiques
// =========================================================

use paillier_crypto::key_management::{
    ensure_keys_directory, key_file_exists, load_keypair_json,
    save_keypair_json, save_public_key_json,
};
use paillier_crypto::math::random_below;
use paillier_crypto::{Ciphertext, CryptoError, KeyGenConfig, KeyPair, Plaintext, Variant};

use rand_core::OsRng;
use std::fs;
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ── Chemins ───────────────────────────────────────────────
const KEYS_DIR:    &str = "keys";
const CONFIG_PATH: &str = "keys/keygen.json";

// Taille par défaut de la démonstration (2048+ en production)
const DEMO_BIT_LENGTH: u64 = 1024;

// ─────────────────────────────────────────────────────────
// Erreur applicative centrale
// ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("Erreur cryptographique : {0}")]
    Crypto(#[from] CryptoError),
    #[error("Erreur I/O : {0}")]
    Io(#[from] io::Error),
}

// ─────────────────────────────────────────────────────────
// Point d'entrée
// ─────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = ensure_keys_directory(KEYS_DIR) {
        error!(error = %e, "impossible de créer le répertoire {KEYS_DIR}/");
        std::process::exit(1);
    }

    let config = match charger_configuration() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "configuration {CONFIG_PATH} invalide");
            std::process::exit(1);
        }
    };

    loop {
        afficher_menu();
        // Fin de stdin : même effet que « Quitter »
        let Some(choix) = lire_ligne(&mut io::stdin().lock()) else {
            println!("\nAu revoir !\n");
            break;
        };

        let variant = match choix.as_str() {
            "1" => Variant::Full,
            "2" => Variant::Simple,
            "3" => { println!("\nAu revoir !\n"); break; }
            _   => { println!("\nChoix invalide. Veuillez choisir 1, 2 ou 3.\n"); continue; }
        };

        let config = KeyGenConfig { variant, ..config.clone() };
        if let Err(e) = demonstration(&config) {
            error!(error = %e, "démonstration interrompue");
        }

        println!("\nAppuyez sur Entrée pour continuer...");
        if lire_ligne(&mut io::stdin().lock()).is_none() {
            break;
        }
    }
}

// ─────────────────────────────────────────────────────────
// Menu
// ─────────────────────────────────────────────────────────

fn afficher_menu() {
    println!("\n╔═══════════════════════════════════════════════╗");
    println!("║   CRYPTOSYSTÈME DE PAILLIER — MENU            ║");
    println!("╚═══════════════════════════════════════════════╝");
    println!("\n  [1] Variante full   (g aléatoire, lambda = lcm)");
    println!("  [2] Variante simple (g = n+1, lambda = phi)");
    println!("  [3] Quitter\n");
    print!("Votre choix : ");
    io::stdout().flush().ok();
}

// None en fin d'entrée (read_line → Ok(0)) ou sur erreur de lecture
fn lire_ligne(reader: &mut impl BufRead) -> Option<String> {
    let mut input = String::new();
    match reader.read_line(&mut input) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(input.trim().to_string()),
    }
}

// ─────────────────────────────────────────────────────────
// Configuration : keys/keygen.json si présent
// ─────────────────────────────────────────────────────────

fn charger_configuration() -> Result<KeyGenConfig, AppError> {
    if !key_file_exists(CONFIG_PATH) {
        return Ok(KeyGenConfig::new(DEMO_BIT_LENGTH, Variant::Full));
    }
    let raw = fs::read_to_string(CONFIG_PATH)?;
    let config = KeyGenConfig::from_json(&raw)?;
    info!(bits = config.bit_length, "configuration chargée depuis {CONFIG_PATH}");
    Ok(config)
}

// ─────────────────────────────────────────────────────────
// Gestion des clés : chargement ou génération + sauvegarde
// ─────────────────────────────────────────────────────────

fn chemins(variant: Variant) -> (String, String) {
    (
        format!("{KEYS_DIR}/keypair_{variant}.json"),
        format!("{KEYS_DIR}/public_key_{variant}.json"),
    )
}

fn charger_ou_generer_cles(config: &KeyGenConfig) -> Result<(KeyPair, Option<Duration>), AppError> {
    let (keypair_path, public_key_path) = chemins(config.variant);

    if key_file_exists(&keypair_path) {
        match load_keypair_json(&keypair_path) {
            Ok(kp) if kp.public_key().bit_length() == config.bit_length => {
                info!(path = %keypair_path, "clés chargées depuis le disque");
                return Ok((kp, None));
            }
            Ok(_) => warn!(path = %keypair_path, "taille de clé différente de la configuration, regénération"),
            Err(e) => warn!(path = %keypair_path, error = %e, "chargement impossible, regénération"),
        }
    }

    println!("\n  Génération des clés ({} bits, variante {})...", config.bit_length, config.variant);
    let t     = Instant::now();
    let kp    = KeyPair::generate(config)?;
    let duree = t.elapsed();

    save_keypair_json(&kp, &keypair_path)?;
    save_public_key_json(kp.public_key(), &public_key_path)?;
    info!(path = %keypair_path, "clés sauvegardées");

    Ok((kp, Some(duree)))
}

fn afficher_cles(kp: &KeyPair) {
    let (pk, sk) = (kp.public_key(), kp.private_key());
    println!("--- CLÉ PUBLIQUE ---");
    println!("  |n|         = {} bits", pk.bit_length());
    println!("  |g|         = {} bits", pk.g().bits());
    println!("  |n²|        = {} bits", pk.n_squared().bits());
    println!("--- CLÉ PRIVÉE ---");
    println!("  |lambda|    = {} bits", sk.lambda().bits());
    println!("  |mu|        = {} bits", sk.mu().bits());
}

fn chronometrer<T>(f: impl FnOnce() -> Result<T, CryptoError>) -> Result<(T, Duration), CryptoError> {
    let t = Instant::now();
    let v = f()?;
    Ok((v, t.elapsed()))
}

fn court(c: &Ciphertext) -> String {
    let hex = c.as_biguint().to_str_radix(16);
    if hex.len() <= 32 {
        return hex;
    }
    format!("{}…{}", &hex[..16], &hex[hex.len() - 16..])
}

// ─────────────────────────────────────────────────────────
// Démonstration : 5 + 2, 2·5, puis deux clairs aléatoires
// ─────────────────────────────────────────────────────────

fn demonstration(config: &KeyGenConfig) -> Result<(), AppError> {
    println!("\n==============================================");
    println!("    Paillier ({}) — Démonstration", config.variant);
    println!("==============================================");

    let (kp, duree_keygen) = charger_ou_generer_cles(config)?;
    afficher_cles(&kp);
    let (pk, sk) = (kp.public_key(), kp.private_key());

    // ── Homomorphisme additif et multiplication par un scalaire ──
    let m1 = Plaintext::from(5u32);
    let m2 = Plaintext::from(2u32);
    let c1 = pk.encrypt(&m1)?;
    let c2 = pk.encrypt(&m2)?;
    println!("\n  m1 = {m1}   c1 = {}", court(&c1));
    println!("  m2 = {m2}   c2 = {}", court(&c2));

    let somme = sk.decrypt(&pk.addition(&[c1.clone(), c2])?)?;
    println!("  D(E(m1)·E(m2))  = {somme}   (attendu 7)");

    let produit = sk.decrypt(&pk.multiply(&c1, &m2)?)?;
    println!("  D(E(m1)^m2)     = {produit}   (attendu 10)");

    // ── Clairs aléatoires dans [0, n) — mesures ──
    let mut rng = OsRng;
    let a = Plaintext::new(random_below(pk.n(), &mut rng)?);
    let b = Plaintext::new(random_below(pk.n(), &mut rng)?);
    let somme_claire = Plaintext::new((a.as_biguint() + b.as_biguint()) % pk.n());

    let (ca, duree_enc)  = chronometrer(|| pk.encrypt(&a))?;
    let cb               = pk.encrypt(&b)?;
    let (cs, duree_add)  = chronometrer(|| pk.addition(&[ca.clone(), cb]))?;
    let (_, duree_mul)   = chronometrer(|| pk.multiply(&ca, &b))?;
    let (ds, duree_dec)  = chronometrer(|| sk.decrypt(&cs))?;

    if ds == somme_claire {
        println!("\n  Homomorphisme additif vérifié : D(E(a)·E(b)) = (a+b) mod n");
    } else {
        println!("\n  Erreur dans l'homomorphisme additif !");
    }

    println!("\n==============================================");
    println!("    RÉSUMÉ DES TEMPS — Paillier ({})", config.variant);
    println!("==============================================");
    match duree_keygen {
        Some(d) => println!("  Génération des clés    : {:.3?}  (nouvelle génération)", d),
        None    => println!("  Génération des clés    : —  (chargées depuis le disque)"),
    }
    println!("  Chiffrement            : {:.3?}", duree_enc);
    println!("  Addition homomorphique : {:.3?}", duree_add);
    println!("  Multiplication scalaire: {:.3?}", duree_mul);
    println!("  Déchiffrement          : {:.3?}", duree_dec);
    println!("==============================================");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_lire_ligne_stops_at_end_of_input() {
        assert_eq!(lire_ligne(&mut Cursor::new("")), None);
    }

    #[test]
    fn test_lire_ligne_trims_choice() {
        let mut input = Cursor::new("  2\n\n");
        assert_eq!(lire_ligne(&mut input), Some("2".to_string()));
        // Ligne vide : choix invalide, pas fin d'entrée
        assert_eq!(lire_ligne(&mut input), Some(String::new()));
        assert_eq!(lire_ligne(&mut input), None);
    }
}
