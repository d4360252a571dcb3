use std::fmt;
use std::sync::Arc;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, OsRng, RngCore};
use tracing::{debug, info};
use zeroize::Zeroize;
use crate::crypto_error::CryptoError;
use crate::paillier::math::{gcd, generate_prime, get_generator, l_function, lcm, mod_inverse};
use super::config::{KeyGenConfig, Variant};

// ============================================================================
// Clé publique Paillier — pas de données secrètes
//
// n² est calculé une seule fois à la construction : chaque encrypt, decrypt,
// addition et multiply en a besoin. Idem pour le test g == n + 1 qui
// sélectionne le raccourci (1 + m·n) de l'exponentiation g^m.
// ============================================================================
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    n:               BigUint,
    g:               BigUint,
    n_squared:       BigUint,
    g_is_n_plus_one: bool,
}

impl PublicKey {
    /// Construit une clé publique à partir de (n, g) et met n² en cache.
    ///
    /// Rejette n <= 1 et g hors de [1, n²).
    pub fn new(n: BigUint, g: BigUint) -> Result<Self, CryptoError> {
        if n <= BigUint::one() {
            return Err(CryptoError::InvalidParameter(
                "le module n doit être > 1".to_string(),
            ));
        }
        let n_squared = &n * &n;
        if g.is_zero() || g >= n_squared {
            return Err(CryptoError::KeyCoherenceError);
        }
        Ok(Self::with_cache(n, g, n_squared))
    }

    // Appelant responsable de n_squared == n·n
    fn with_cache(n: BigUint, g: BigUint, n_squared: BigUint) -> Self {
        let g_is_n_plus_one = g == &n + BigUint::one();
        PublicKey { n, g, n_squared, g_is_n_plus_one }
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn g(&self) -> &BigUint {
        &self.g
    }

    pub fn n_squared(&self) -> &BigUint {
        &self.n_squared
    }

    pub fn bit_length(&self) -> u64 {
        self.n.bits()
    }

    /// Vrai pour g = n + 1 (variante simple, ou clé chargée équivalente).
    pub(crate) fn g_is_n_plus_one(&self) -> bool {
        self.g_is_n_plus_one
    }
}

// ============================================================================
// Clé privée Paillier — ZEROISÉE À LA DESTRUCTION
//
// decrypt n'utilise que lambda, mu et (n, n²) de la clé publique.
// p et q sont conservés parce qu'ils sortent gratuitement de la génération.
// La clé publique est partagée via Arc : une seule source pour n et n².
// ============================================================================
#[derive(Clone)]
pub struct PrivateKey {
    lambda:     BigUint,
    mu:         BigUint,
    p:          BigUint,
    q:          BigUint,
    public_key: Arc<PublicKey>,
}

impl PrivateKey {
    /// Associe (lambda, mu, p, q) à sa clé publique.
    ///
    /// Retourne `KeyCoherenceError` si p·q != n : une clé privée n'est
    /// jamais valide contre une autre clé publique.
    pub fn new(
        lambda: BigUint,
        mu: BigUint,
        p: BigUint,
        q: BigUint,
        public_key: Arc<PublicKey>,
    ) -> Result<Self, CryptoError> {
        if &p * &q != *public_key.n() {
            return Err(CryptoError::KeyCoherenceError);
        }
        Ok(PrivateKey { lambda, mu, p, q, public_key })
    }

    pub fn lambda(&self) -> &BigUint {
        &self.lambda
    }

    pub fn mu(&self) -> &BigUint {
        &self.mu
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn q(&self) -> &BigUint {
        &self.q
    }

    pub fn public_key(&self) -> &Arc<PublicKey> {
        &self.public_key
    }

    pub fn n(&self) -> &BigUint {
        self.public_key.n()
    }

    pub fn bit_length(&self) -> u64 {
        self.public_key.bit_length()
    }

    /// Vérifie que (lambda, mu) correspondent bien à (p, q, g).
    ///
    /// lambda doit valoir lcm(p-1, q-1) ou phi(n), et
    /// L(g^lambda mod n², n)·mu ≡ 1 (mod n). Sinon `KeyCoherenceError` :
    /// une clé altérée déchiffrerait silencieusement de travers.
    pub(crate) fn check_coherence(&self) -> Result<(), CryptoError> {
        let n = self.public_key.n();
        if self.p.is_zero() || self.q.is_zero() {
            return Err(CryptoError::KeyCoherenceError);
        }
        let p_minus_1 = &self.p - BigUint::one();
        let q_minus_1 = &self.q - BigUint::one();
        let phi = &p_minus_1 * &q_minus_1;
        if self.lambda != phi && self.lambda != lcm(&p_minus_1, &q_minus_1) {
            return Err(CryptoError::KeyCoherenceError);
        }

        let n_squared = self.public_key.n_squared();
        let l = l_function(&self.public_key.g().modpow(&self.lambda, n_squared), n);
        if !((l * &self.mu) % n).is_one() {
            return Err(CryptoError::KeyCoherenceError);
        }
        Ok(())
    }
}

// BigUint n'expose pas ses limbs : on écrase par une valeur nulle de même
// taille avant de libérer.
fn zeroize_biguint(n: &mut BigUint) {
    let bits = n.bits() as usize;
    if bits > 0 {
        *n = BigUint::from_bytes_be(&vec![0u8; (bits + 7) / 8]);
    }
    *n = BigUint::default();
}

impl Zeroize for PrivateKey {
    fn zeroize(&mut self) {
        zeroize_biguint(&mut self.lambda);
        zeroize_biguint(&mut self.mu);
        zeroize_biguint(&mut self.p);
        zeroize_biguint(&mut self.q);
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

// Jamais de champ secret dans les logs
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bit_length", &self.bit_length())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Paire de clés
// ============================================================================
#[derive(Clone, Debug)]
pub struct KeyPair {
    public_key:  Arc<PublicKey>,
    private_key: PrivateKey,
}

impl KeyPair {
    /// Génère une paire de `bit_length` bits avec les budgets par défaut.
    pub fn new(bit_length: u64, variant: Variant) -> Result<Self, CryptoError> {
        Self::generate(&KeyGenConfig::new(bit_length, variant))
    }

    /// Génère une paire à partir de l'entropie système.
    ///
    /// Avec la feature `parallel`, p et q sont cherchés sur deux threads rayon.
    pub fn generate(config: &KeyGenConfig) -> Result<Self, CryptoError> {
        config.validate()?;

        #[cfg(feature = "parallel")]
        let (p, q, n, attempts) = draw_primes_parallel(config)?;
        #[cfg(not(feature = "parallel"))]
        let (p, q, n, attempts) = draw_primes(config, &mut OsRng)?;

        derive_keys(p, q, n, attempts, config, &mut OsRng)
    }

    /// Génère une paire à partir d'une source d'aléa fournie par l'appelant.
    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        config: &KeyGenConfig,
        rng: &mut R,
    ) -> Result<Self, CryptoError> {
        config.validate()?;
        let (p, q, n, attempts) = draw_primes(config, rng)?;
        derive_keys(p, q, n, attempts, config, rng)
    }

    pub fn public_key(&self) -> &Arc<PublicKey> {
        &self.public_key
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn into_parts(self) -> (Arc<PublicKey>, PrivateKey) {
        (self.public_key, self.private_key)
    }

    /// Réassemble une paire chargée depuis un encodage externe.
    pub(crate) fn from_parts(private_key: PrivateKey) -> Self {
        KeyPair {
            public_key: Arc::clone(private_key.public_key()),
            private_key,
        }
    }
}

// ---------------------------------------------------------------------------
// Étape 1 : tirage de (p, q) jusqu'à obtenir p != q et |n| = bit_length.
//
// Deux premiers de bit_length/2 bits donnent un produit de bit_length ou
// bit_length - 1 bits : le second cas est rejeté, pas corrigé.
// ---------------------------------------------------------------------------
fn draw_primes<R: RngCore + CryptoRng>(
    config: &KeyGenConfig,
    rng: &mut R,
) -> Result<(BigUint, BigUint, BigUint, u32), CryptoError> {
    let half = config.bit_length / 2;

    for attempt in 1..=config.max_attempts {
        let p = generate_prime(half, rng)?;
        let q = generate_prime(half, rng)?;
        if let Some(n) = accept_primes(&p, &q, config.bit_length, attempt) {
            return Ok((p, q, n, attempt));
        }
    }

    Err(CryptoError::PrimeSearchExhausted { attempts: config.max_attempts })
}

#[cfg(feature = "parallel")]
fn draw_primes_parallel(
    config: &KeyGenConfig,
) -> Result<(BigUint, BigUint, BigUint, u32), CryptoError> {
    let half = config.bit_length / 2;

    for attempt in 1..=config.max_attempts {
        let (p, q) = rayon::join(
            || generate_prime(half, &mut OsRng),
            || generate_prime(half, &mut OsRng),
        );
        let (p, q) = (p?, q?);
        if let Some(n) = accept_primes(&p, &q, config.bit_length, attempt) {
            return Ok((p, q, n, attempt));
        }
    }

    Err(CryptoError::PrimeSearchExhausted { attempts: config.max_attempts })
}

// Point de sérialisation unique d'une tentative : distinction et taille de n.
fn accept_primes(p: &BigUint, q: &BigUint, bit_length: u64, attempt: u32) -> Option<BigUint> {
    if p == q {
        debug!(attempt, "p == q, nouveau tirage");
        return None;
    }
    let n = p * q;
    if n.bits() != bit_length {
        debug!(attempt, got = n.bits(), want = bit_length, "taille de n incorrecte, nouveau tirage");
        return None;
    }
    Some(n)
}

// ---------------------------------------------------------------------------
// Étapes 2 à 5 : (g, lambda, mu) selon la variante, puis assemblage.
// ---------------------------------------------------------------------------
fn derive_keys<R: RngCore + CryptoRng>(
    p: BigUint,
    q: BigUint,
    n: BigUint,
    attempts: u32,
    config: &KeyGenConfig,
    rng: &mut R,
) -> Result<KeyPair, CryptoError> {
    let n_squared = &n * &n;
    let p_minus_1 = &p - BigUint::one();
    let q_minus_1 = &q - BigUint::one();

    let (g, lambda, mu) = match config.variant {
        Variant::Simple => {
            let g      = &n + BigUint::one();
            let lambda = &p_minus_1 * &q_minus_1;
            let mu     = mod_inverse(&lambda, &n)
                .ok_or(CryptoError::InvariantViolation("phi non inversible modulo n"))?;
            (g, lambda, mu)
        }
        Variant::Full => {
            let lambda  = lcm(&p_minus_1, &q_minus_1);
            let (g, mu) = derive_generator(&n, &n_squared, &lambda, config.max_generator_attempts, rng)?;
            (g, lambda, mu)
        }
    };

    let public_key  = Arc::new(PublicKey::with_cache(n, g, n_squared));
    let private_key = PrivateKey::new(lambda, mu, p, q, Arc::clone(&public_key))?;

    info!(
        bits = public_key.bit_length(),
        variant = %config.variant,
        attempts,
        "paire de clés Paillier générée"
    );

    Ok(KeyPair { public_key, private_key })
}

// Tire g jusqu'à ce que g soit une unité mod n² et que L(g^lambda mod n², n)
// soit inversible mod n. Budget épuisé : invariant violé, rien d'autre à tenter.
fn derive_generator<R: RngCore + CryptoRng>(
    n: &BigUint,
    n_squared: &BigUint,
    lambda: &BigUint,
    max_attempts: u32,
    rng: &mut R,
) -> Result<(BigUint, BigUint), CryptoError> {
    for attempt in 1..=max_attempts {
        let g = get_generator(n, n_squared, rng)?;
        if !gcd(&g, n).is_one() {
            debug!(attempt, "g non inversible modulo n², nouveau tirage");
            continue;
        }

        let l = l_function(&g.modpow(lambda, n_squared), n);
        match mod_inverse(&l, n) {
            Some(mu) => return Ok((g, mu)),
            None => debug!(attempt, "L(g^lambda) non inversible modulo n, nouveau tirage"),
        }
    }

    Err(CryptoError::InvariantViolation(
        "aucun générateur valide dans le budget de tirages",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paillier::math::random::test_rng::{ConstantRng, FailingRng};
    use crate::paillier::math::is_probable_prime;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;
    use rstest::rstest;

    fn seeded(seed: u64) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(seed)
    }

    #[rstest]
    fn test_small_keys_have_exact_shape(
        #[values(8, 10, 16, 32, 64, 128, 256)] bits: u64,
        #[values(Variant::Simple, Variant::Full)] variant: Variant,
    ) {
        let mut rng = seeded(bits);
        let kp = KeyPair::generate_with_rng(&KeyGenConfig::new(bits, variant), &mut rng).unwrap();
        let pk = kp.public_key();
        let sk = kp.private_key();

        assert_eq!(pk.bit_length(), bits);
        assert_ne!(sk.p(), sk.q());
        assert_eq!(sk.p() * sk.q(), *pk.n());
        assert_eq!(*pk.n_squared(), pk.n() * pk.n());
        assert_eq!(sk.p().bits(), bits / 2);
        assert_eq!(sk.q().bits(), bits / 2);
        assert!(is_probable_prime(sk.p(), 40, &mut rng).unwrap());
        assert!(is_probable_prime(sk.q(), 40, &mut rng).unwrap());
        assert!(Arc::ptr_eq(pk, sk.public_key()));
    }

    #[test]
    fn test_simple_variant_uses_n_plus_one_and_phi() {
        let kp = KeyPair::generate_with_rng(&KeyGenConfig::new(128, Variant::Simple), &mut seeded(3)).unwrap();
        let (pk, sk) = (kp.public_key(), kp.private_key());
        let phi = (sk.p() - 1u32) * (sk.q() - 1u32);

        assert_eq!(*pk.g(), pk.n() + 1u32);
        assert_eq!(*sk.lambda(), phi);
        assert_eq!((sk.lambda() * sk.mu()) % pk.n(), BigUint::one());
    }

    #[test]
    fn test_full_variant_uses_lcm_and_inverts_l() {
        let kp = KeyPair::generate_with_rng(&KeyGenConfig::new(128, Variant::Full), &mut seeded(4)).unwrap();
        let (pk, sk) = (kp.public_key(), kp.private_key());

        assert_eq!(*sk.lambda(), lcm(&(sk.p() - 1u32), &(sk.q() - 1u32)));
        assert!(pk.g() < pk.n_squared());
        let l = l_function(&pk.g().modpow(sk.lambda(), pk.n_squared()), pk.n());
        assert_eq!((l * sk.mu()) % pk.n(), BigUint::one());
    }

    #[rstest]
    #[case(1024, Variant::Full)]
    #[case(2048, Variant::Full)]
    #[case(2048, Variant::Simple)]
    fn test_key_shape_with_os_entropy(#[case] bits: u64, #[case] variant: Variant) {
        let kp = KeyPair::new(bits, variant).unwrap();
        assert_eq!(kp.public_key().bit_length(), bits);
        assert_eq!(kp.private_key().bit_length(), bits);
    }

    #[rstest]
    #[ignore = "génération 3072/4096 bits : plusieurs dizaines de secondes"]
    fn test_large_key_shape_with_os_entropy(#[values(3072, 4096)] bits: u64) {
        let kp = KeyPair::new(bits, Variant::Full).unwrap();
        assert_eq!(kp.public_key().bit_length(), bits);
    }

    #[rstest]
    #[case(9)]
    #[case(u64::MAX - 1)]
    fn test_invalid_config_rejected_before_drawing(#[case] bits: u64) {
        let err = KeyPair::generate_with_rng(&KeyGenConfig::new(bits, Variant::Full), &mut FailingRng).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidParameter(_)));
    }

    #[test]
    fn test_failing_source_surfaces() {
        let err = KeyPair::generate_with_rng(&KeyGenConfig::new(64, Variant::Full), &mut FailingRng).unwrap_err();
        assert!(matches!(err, CryptoError::RandomnessUnavailable(_)));
    }

    #[test]
    fn test_composite_only_source_exhausts_prime_search() {
        // 4 bits à partir d'octets nuls : toujours 9
        let err = KeyPair::generate_with_rng(&KeyGenConfig::new(8, Variant::Simple), &mut ConstantRng(0)).unwrap_err();
        assert!(matches!(err, CryptoError::PrimeSearchExhausted { .. }));
    }

    #[test]
    fn test_equal_primes_exhaust_outer_budget() {
        // Octets 0x0D : toujours 13, donc p == q à chaque tentative
        let config = KeyGenConfig::new(8, Variant::Simple).with_max_attempts(3);
        let err = KeyPair::generate_with_rng(&config, &mut ConstantRng(0x0D)).unwrap_err();
        assert_eq!(err, CryptoError::PrimeSearchExhausted { attempts: 3 });
    }

    #[test]
    fn test_public_key_validation() {
        let n = BigUint::from(143u32);
        assert!(matches!(
            PublicKey::new(BigUint::one(), BigUint::from(2u32)),
            Err(CryptoError::InvalidParameter(_))
        ));
        assert_eq!(PublicKey::new(n.clone(), BigUint::zero()), Err(CryptoError::KeyCoherenceError));
        assert_eq!(PublicKey::new(n.clone(), &n * &n), Err(CryptoError::KeyCoherenceError));

        let pk = PublicKey::new(n.clone(), &n + 1u32).unwrap();
        assert_eq!(*pk.n_squared(), BigUint::from(20449u32));
    }

    #[test]
    fn test_private_key_rejects_foreign_public_key() {
        let pk = Arc::new(PublicKey::new(BigUint::from(143u32), BigUint::from(144u32)).unwrap());
        let err = PrivateKey::new(
            BigUint::from(120u32),
            BigUint::from(87u32),
            BigUint::from(11u32),
            BigUint::from(17u32),
            pk,
        )
        .unwrap_err();
        assert_eq!(err, CryptoError::KeyCoherenceError);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let kp = KeyPair::generate_with_rng(&KeyGenConfig::new(64, Variant::Simple), &mut seeded(9)).unwrap();
        let rendered = format!("{:?}", kp.private_key());
        assert!(!rendered.contains(&kp.private_key().lambda().to_string()));
        assert!(!rendered.contains(&kp.private_key().p().to_string()));
    }

    #[test]
    fn test_generator_shortcut_flag_follows_variant() {
        let simple = KeyPair::generate_with_rng(&KeyGenConfig::new(64, Variant::Simple), &mut seeded(11)).unwrap();
        let full = KeyPair::generate_with_rng(&KeyGenConfig::new(64, Variant::Full), &mut seeded(12)).unwrap();
        assert!(simple.public_key().g_is_n_plus_one());
        assert!(!full.public_key().g_is_n_plus_one());

        // Clé publique reconstruite à partir de (n, n + 1) : même raccourci
        let n = BigUint::from(143u32);
        assert!(PublicKey::new(n.clone(), &n + 1u32).unwrap().g_is_n_plus_one());
        assert!(!PublicKey::new(n, BigUint::from(2u32)).unwrap().g_is_n_plus_one());
    }

    #[rstest]
    fn test_generated_keys_are_coherent(#[values(Variant::Simple, Variant::Full)] variant: Variant) {
        let kp = KeyPair::generate_with_rng(&KeyGenConfig::new(128, variant), &mut seeded(13)).unwrap();
        assert_eq!(kp.private_key().check_coherence(), Ok(()));
    }

    #[rstest]
    #[case::lambda_shifted(1, 0)]
    #[case::mu_shifted(0, 1)]
    fn test_altered_secret_is_incoherent(#[case] lambda_delta: u32, #[case] mu_delta: u32) {
        let kp = KeyPair::generate_with_rng(&KeyGenConfig::new(128, Variant::Full), &mut seeded(14)).unwrap();
        let sk = kp.private_key();
        let altered = PrivateKey::new(
            sk.lambda() + lambda_delta,
            (sk.mu() + mu_delta) % sk.n(),
            sk.p().clone(),
            sk.q().clone(),
            Arc::clone(sk.public_key()),
        )
        .unwrap();
        assert_eq!(altered.check_coherence(), Err(CryptoError::KeyCoherenceError));
    }

    #[test]
    fn test_zeroize_clears_secret_fields() {
        let kp = KeyPair::generate_with_rng(&KeyGenConfig::new(64, Variant::Full), &mut seeded(10)).unwrap();
        let (_, mut sk) = kp.into_parts();
        sk.zeroize();
        assert!(sk.lambda().is_zero());
        assert!(sk.mu().is_zero());
        assert!(sk.p().is_zero());
        assert!(sk.q().is_zero());
    }
}
