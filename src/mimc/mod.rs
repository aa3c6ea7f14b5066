//! MiMC hash over the BN254 scalar field.
//!
//! Miyaguchi-Preneel construction around the MiMC-5 block cipher with 110 rounds.
//! Round constants are derived from iterated Keccak-256 of the seed `"seed"`.
//! The native hasher and the circuit gadget share the same constants and must
//! stay in lockstep.

pub mod constraints;
pub mod native;

use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_ff::PrimeField;
use sha3::{Digest, Keccak256};

pub use constraints::MimcGadget;
pub use native::MimcHasher;

/// Number of cipher rounds.
pub const MIMC_ROUNDS: usize = 110;

/// Exponent of the round function.
pub const MIMC_EXPONENT: u64 = 5;

/// Seed the round constants are derived from.
const MIMC_SEED: &[u8] = b"seed";

/// Round constants, derived once and shared read-only.
pub fn round_constants() -> &'static [Fr] {
    static CONSTANTS: OnceLock<Vec<Fr>> = OnceLock::new();
    CONSTANTS.get_or_init(derive_constants)
}

fn derive_constants() -> Vec<Fr> {
    let mut rnd = Keccak256::digest(MIMC_SEED);
    (0..MIMC_ROUNDS)
        .map(|_| {
            rnd = Keccak256::digest(rnd);
            Fr::from_be_bytes_mod_order(&rnd)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_are_stable() {
        let constants = round_constants();
        assert_eq!(constants.len(), MIMC_ROUNDS);
        assert_eq!(constants, derive_constants().as_slice());
        assert_ne!(constants[0], constants[1]);
    }
}
