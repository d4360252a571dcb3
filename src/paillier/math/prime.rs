use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};
use crate::crypto_error::CryptoError;
use super::random::{random_bits, random_range};

// ---------------------------------------------------------------------------
// Table de petits premiers (crible préliminaire, couvre jusqu'à 997)
// ---------------------------------------------------------------------------
const SMALL_PRIMES: &[u32] = &[
      3,   5,   7,  11,  13,  17,  19,  23,  29,  31,
     37,  41,  43,  47,  53,  59,  61,  67,  71,  73,
     79,  83,  89,  97, 101, 103, 107, 109, 113, 127,
    131, 137, 139, 149, 151, 157, 163, 167, 173, 179,
    181, 191, 193, 197, 199, 211, 223, 227, 229, 233,
    239, 241, 251, 257, 263, 269, 271, 277, 281, 283,
    293, 307, 311, 313, 317, 331, 337, 347, 349, 353,
    359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467,
    479, 487, 491, 499, 503, 509, 521, 523, 541, 547,
    557, 563, 569, 571, 577, 587, 593, 599, 601, 607,
    613, 617, 619, 631, 641, 643, 647, 653, 659, 661,
    673, 677, 683, 691, 701, 709, 719, 727, 733, 739,
    743, 751, 757, 761, 769, 773, 787, 797, 809, 811,
    821, 823, 827, 829, 839, 853, 857, 859, 863, 877,
    881, 883, 887, 907, 911, 919, 929, 937, 941, 947,
    953, 967, 971, 977, 983, 991, 997,
];

/// Nombre de rounds Miller-Rabin selon la taille du candidat.
///
/// Les grands candidats aléatoires ont une probabilité d'erreur par round
/// bien inférieure à 1/4, d'où moins de rounds à partir de 512 bits.
pub fn miller_rabin_rounds(bits: u64) -> u32 {
    match bits {
        b if b >= 1024 => 5,
        b if b >= 512  => 8,
        b if b >= 256  => 16,
        _              => 40,
    }
}

/// Budget de candidats pour un premier de `bits` bits.
///
/// La densité des premiers impairs autour de 2^bits est ~ 2/(bits·ln 2) :
/// 100·bits candidats laissent une marge énorme, + 1000 pour les petites tailles.
pub fn prime_candidate_budget(bits: u64) -> u32 {
    let budget = bits.saturating_mul(100).saturating_add(1000);
    u32::try_from(budget).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Premier aléatoire d'exactement `bits` bits
//
// Bit de poids fort forcé (taille exacte du premier), bit 0 forcé (impair).
// Le produit de deux tels premiers peut n'avoir que 2·bits - 1 bits : c'est
// la génération de clés qui vérifie la taille de n et refait le tirage.
// ---------------------------------------------------------------------------
pub fn generate_prime<R: RngCore + CryptoRng>(bits: u64, rng: &mut R) -> Result<BigUint, CryptoError> {
    if bits < 2 {
        return Err(CryptoError::InvalidParameter(format!(
            "un premier de {bits} bit(s) n'a pas de sens"
        )));
    }

    let budget = prime_candidate_budget(bits);
    let rounds = miller_rabin_rounds(bits);

    for _ in 0..budget {
        let mut candidate = random_bits(bits, rng)?;
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(0, true);

        if has_small_factor(&candidate) {
            continue;
        }
        if is_probable_prime(&candidate, rounds, rng)? {
            return Ok(candidate);
        }
    }

    Err(CryptoError::PrimeSearchExhausted { attempts: budget })
}

// Vrai si n est divisible par un petit premier de la table (sans être ce premier).
fn has_small_factor(n: &BigUint) -> bool {
    for &p in SMALL_PRIMES {
        if n == &BigUint::from(p) {
            return false;
        }
        if (n % p).is_zero() {
            return true;
        }
    }
    false
}

/// Test de Miller-Rabin, témoins tirés uniformément dans [2, n-2].
pub fn is_probable_prime<R: RngCore + CryptoRng>(
    n: &BigUint,
    rounds: u32,
    rng: &mut R,
) -> Result<bool, CryptoError> {
    let two = BigUint::from(2u32);
    if n < &two {
        return Ok(false);
    }
    if n == &two || n == &BigUint::from(3u32) {
        return Ok(true);
    }
    if n.is_even() {
        return Ok(false);
    }
    if SMALL_PRIMES.iter().any(|&p| n == &BigUint::from(p)) {
        return Ok(true);
    }

    let n_minus_1 = n - BigUint::one();
    let mut d = n_minus_1.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    let high = n - BigUint::one();
    'witness: for _ in 0..rounds {
        let a = random_range(&two, &high, rng)?;
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return Ok(false);
    }
    Ok(true)
}
