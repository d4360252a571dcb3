use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};
use crate::crypto_error::CryptoError;
use super::random::random_below;

/// Plus petit module accepté : deux premiers distincts de 4 bits (11·13 = 143).
pub const MIN_MODULUS_BITS: u64 = 8;

/// Plus grand module accepté. Borne aussi les champs des fichiers de clés.
pub const MAX_MODULUS_BITS: u64 = 16_384;

// Fonction L(x) = (x-1)/n, division tronquée.
// Pour x = 0, le quotient tronqué de -1/n vaut 0 : decrypt(0) reste défini.
pub fn l_function(x: &BigUint, n: &BigUint) -> BigUint {
    if x.is_zero() {
        return BigUint::zero();
    }
    (x - BigUint::one()) / n
}

pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    a.gcd(b)
}

pub fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    let d = gcd(a, b);
    if d.is_zero() {
        return BigUint::zero();
    }
    (a * b) / d
}

// ---------------------------------------------------------------------------
// Inverse modulaire de a mod m.
// None si gcd(a, m) != 1 : à l'appelant de décider si c'est un invariant
// violé (variante simple) ou un tirage à refaire (dérivation de g).
// ---------------------------------------------------------------------------
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    // modinv panique sur un module nul
    if m.is_zero() {
        return None;
    }
    (a % m).modinv(m)
}

// ---------------------------------------------------------------------------
// Dérivation du générateur (variante full)
//
//   alpha, beta uniformes dans [0, n)
//   g = ((alpha·n + 1) · beta^n mod n²) mod n²
//
// Aucune validation ici : la génération de clés vérifie que g est une unité
// et que L(g^lambda mod n², n) est inversible, et refait le tirage sinon.
// ---------------------------------------------------------------------------
pub fn get_generator<R: RngCore + CryptoRng>(
    n: &BigUint,
    n_squared: &BigUint,
    rng: &mut R,
) -> Result<BigUint, CryptoError> {
    let alpha = random_below(n, rng)?;
    let beta  = random_below(n, rng)?;

    let blind = beta.modpow(n, n_squared);
    Ok(((&alpha * n + BigUint::one()) * blind) % n_squared)
}
