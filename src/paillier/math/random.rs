use num_bigint::BigUint;
use num_traits::Zero;
use rand_core::{CryptoRng, RngCore};
use crate::crypto_error::CryptoError;

// Nombre maximal de rejets pour un tirage uniforme sous une borne.
// Chaque tirage est accepté avec probabilité > 1/2 : 128 rejets consécutifs
// signalent une source d'aléa dégénérée, pas de la malchance.
const MAX_REJECTION_DRAWS: u32 = 128;

/// Tire un entier uniforme dans [0, 2^bits).
///
/// Passe par `try_fill_bytes` pour qu'une source défaillante remonte
/// `RandomnessUnavailable` au lieu de paniquer.
pub fn random_bits<R: RngCore + CryptoRng>(bits: u64, rng: &mut R) -> Result<BigUint, CryptoError> {
    if bits == 0 {
        return Ok(BigUint::zero());
    }

    let len = ((bits + 7) / 8) as usize;
    let mut buf = vec![0u8; len];
    rng.try_fill_bytes(&mut buf)?;

    let excess = (len as u64) * 8 - bits;
    if excess > 0 {
        buf[0] &= 0xFF >> excess;
    }

    Ok(BigUint::from_bytes_be(&buf))
}

/// Tire un entier uniforme dans [0, bound) par rejet.
pub fn random_below<R: RngCore + CryptoRng>(bound: &BigUint, rng: &mut R) -> Result<BigUint, CryptoError> {
    if bound.is_zero() {
        return Err(CryptoError::InvalidParameter(
            "borne de tirage nulle".to_string(),
        ));
    }

    let bits = bound.bits();
    for _ in 0..MAX_REJECTION_DRAWS {
        let candidate = random_bits(bits, rng)?;
        if &candidate < bound {
            return Ok(candidate);
        }
    }

    Err(CryptoError::RandomnessUnavailable(format!(
        "{MAX_REJECTION_DRAWS} tirages consécutifs rejetés sous une borne de {bits} bits"
    )))
}

/// Tire un entier uniforme dans [low, high).
pub fn random_range<R: RngCore + CryptoRng>(
    low: &BigUint,
    high: &BigUint,
    rng: &mut R,
) -> Result<BigUint, CryptoError> {
    if high <= low {
        return Err(CryptoError::InvalidParameter(
            "intervalle de tirage vide".to_string(),
        ));
    }
    Ok(low + random_below(&(high - low), rng)?)
}
