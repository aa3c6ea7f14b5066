//! In-circuit MiMC gadget mirroring [`super::MimcHasher`].

use ark_bn254::Fr;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::{fp::FpVar, FieldVar};
use ark_r1cs_std::R1CSVar;
use ark_relations::r1cs::SynthesisError;

use super::round_constants;

/// MiMC sponge state inside a constraint system.
///
/// Absorption order matters: blocks are chained through the running state.
pub struct MimcGadget {
    state: FpVar<Fr>,
}

impl MimcGadget {
    pub fn new() -> Self {
        Self { state: FpVar::zero() }
    }

    /// Absorb one field element.
    pub fn absorb(&mut self, block: &FpVar<Fr>) -> Result<(), SynthesisError> {
        let encrypted = self.encrypt(block)?;
        let next = &self.state + &encrypted + block;

        // The chained state is a single variable, never an inlined combination.
        self.state = if next.is_constant() {
            next
        } else {
            let pinned = FpVar::new_witness(next.cs(), || next.value())?;
            pinned.enforce_equal(&next)?;
            pinned
        };
        Ok(())
    }

    /// Current digest.
    pub fn finalize(self) -> FpVar<Fr> {
        self.state
    }

    fn encrypt(&self, block: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        let mut m = block.clone();
        for c in round_constants() {
            // (m + k + c)^5
            let t = &m + &self.state + *c;
            let t4 = t.square()?.square()?;
            m = &t4 * &t;
        }
        Ok(m + &self.state)
    }
}

impl Default for MimcGadget {
    fn default() -> Self {
        Self::new()
    }
}
