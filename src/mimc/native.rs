//! Off-circuit MiMC hasher.

use ark_bn254::Fr;
use ark_ff::{Field, PrimeField};

use super::{round_constants, MIMC_EXPONENT};
use crate::encoding::{field_element_bytes, ELEMENT_BYTES};
use crate::error::HashError;

/// Incremental MiMC hasher. Create one per hash; it is not meant to be shared.
#[derive(Clone, Debug, Default)]
pub struct MimcHasher {
    blocks: Vec<Fr>,
}

impl MimcHasher {
    /// Size in bytes of one absorbed block.
    pub const BLOCK_SIZE: usize = ELEMENT_BYTES;

    /// Create an empty hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb big-endian 32-byte blocks.
    ///
    /// Every block must be the canonical encoding of a field element.
    pub fn update(&mut self, data: &[u8]) -> Result<(), HashError> {
        if data.len() % Self::BLOCK_SIZE != 0 {
            return Err(HashError::MisalignedInput(data.len()));
        }

        for (index, block) in data.chunks_exact(Self::BLOCK_SIZE).enumerate() {
            let element = Fr::from_be_bytes_mod_order(block);
            if field_element_bytes(&element) != block {
                return Err(HashError::NonCanonicalBlock(self.blocks.len() + index));
            }
            self.blocks.push(element);
        }

        Ok(())
    }

    /// Absorb one field element.
    pub fn absorb(&mut self, element: Fr) {
        self.blocks.push(element);
    }

    /// Compress everything absorbed so far.
    pub fn finalize_element(&self) -> Fr {
        let constants = round_constants();
        self.blocks.iter().fold(Fr::from(0u64), |h, m| {
            h + encrypt(constants, *m, h) + m
        })
    }

    /// Digest as 32 big-endian bytes.
    pub fn finalize(&self) -> [u8; ELEMENT_BYTES] {
        field_element_bytes(&self.finalize_element())
    }
}

/// MiMC-5 keyed permutation.
fn encrypt(constants: &[Fr], mut m: Fr, key: Fr) -> Fr {
    for c in constants {
        m = (m + key + c).pow([MIMC_EXPONENT]);
    }
    m + key
}

/// Hash a sequence of field elements.
pub fn hash_elements(elements: &[Fr]) -> Fr {
    let mut hasher = MimcHasher::new();
    for element in elements {
        hasher.absorb(*element);
    }
    hasher.finalize_element()
}
