// ===========================================================================
// Gestion centralisée des erreurs cryptographiques
//
// Tous les modules retournent ce type au lieu de panic!/assert!/unwrap().
// Les erreurs de plage et de paramètres sont rejetées à la frontière de
// l'API ; les boucles de tirage sont bornées et leur épuisement remonte
// ici comme erreur terminale.
// ===========================================================================

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CryptoError {
    // --- Erreurs de paramètres d'entrée ---
    /// Paramètre de génération ou d'appel invalide (taille impaire, budget nul, addition vide…)
    #[error("Paramètre invalide : {0}")]
    InvalidParameter(String),
    /// Le clair m est >= n (hors domaine plaintext Paillier)
    #[error("Le clair doit être dans [0, n)")]
    InvalidPlaintext,
    /// Le chiffré c est >= n² (hors domaine ciphertext Paillier)
    #[error("Le chiffré doit être dans [0, n²)")]
    InvalidCiphertext,

    // --- Erreurs de génération ---
    /// Budget de tirages de premiers épuisé
    #[error("Recherche de nombres premiers abandonnée après {attempts} tentatives")]
    PrimeSearchExhausted { attempts: u32 },
    /// Un inverse modulaire garanti par les mathématiques n'existe pas : bug, jamais réessayé
    #[error("Invariant violé : {0}")]
    InvariantViolation(&'static str),
    /// La source d'aléa sécurisée ne répond pas
    #[error("Source d'aléa indisponible : {0}")]
    RandomnessUnavailable(String),

    // --- Erreurs d'encodage / de stockage des clés ---
    /// Parsing hexadécimal ou décimal invalide dans un champ de clé
    #[error("Parsing invalide d'un champ de clé")]
    HexParseError,
    /// Champ trop long : vecteur DoS potentiel (conversion BigUint coûteuse)
    #[error("Champ trop long : {actual} caractères (maximum autorisé : {maximum})")]
    HexFieldTooLong { actual: usize, maximum: usize },
    /// p·q != n, ou g hors de [1, n²) : clé corrompue ou falsifiée
    #[error("Clé incohérente : les champs ne correspondent pas au module n")]
    KeyCoherenceError,
}

impl From<rand_core::Error> for CryptoError {
    fn from(e: rand_core::Error) -> Self {
        CryptoError::RandomnessUnavailable(e.to_string())
    }
}
