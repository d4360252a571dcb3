// Réexporte toutes les fonctions mathématiques

mod math;
mod prime;
pub(crate) mod random;

pub use math::{gcd, get_generator, l_function, lcm, mod_inverse, MAX_MODULUS_BITS, MIN_MODULUS_BITS};
pub use prime::{generate_prime, is_probable_prime, miller_rabin_rounds, prime_candidate_budget};
pub use random::{random_below, random_bits, random_range};
