//! Verification code circuit.
//!
//! Proves knowledge of an email whose verification code, derived with a public
//! salt, equals a public code.
//!
//! Public inputs (in allocation order):
//! - salt: 38 field elements packing the user's salt
//! - code: 6 hex digits of the verification code, most significant first
//!
//! Private witnesses:
//! - email: 38 field elements packing the email address
//!
//! For each index the email and salt elements are decomposed into bits, XORed
//! bitwise and recombined, then absorbed into MiMC in order. The low 24 bits of
//! the digest, read as six nibbles, must equal the public code digits.

use ark_bn254::Fr;
use ark_ff::Field;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::{AllocVar, Boolean, EqGadget, FieldVar, ToBitsGadget};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::encoding::{
    code_to_digits, field_element_bytes, string_to_field_elements, CodeDigits, FieldElementVector,
    CODE_LENGTH, FIELD_ELEMENTS,
};
use crate::error::EncodingError;
use crate::mimc::{native::hash_elements, MimcGadget};

/// Bits of the digest that carry the code.
const CODE_BITS: usize = CODE_LENGTH * 4;

/// Split the low 24 bits of a digest into nibbles, most significant first.
pub fn digest_to_digits(digest: &Fr) -> CodeDigits {
    let bytes = field_element_bytes(digest);
    let tail = &bytes[bytes.len() - CODE_LENGTH / 2..];

    let mut digits = [0u8; CODE_LENGTH];
    for (pair, byte) in digits.chunks_exact_mut(2).zip(tail) {
        pair[0] = byte >> 4;
        pair[1] = byte & 0x0f;
    }
    digits
}

/// Circuit binding a secret email and a public salt to a public code.
#[derive(Clone)]
pub struct VerificationCodeCircuit {
    /// Private: packed email address.
    pub email: Option<FieldElementVector>,
    /// Public: packed salt.
    pub salt: Option<FieldElementVector>,
    /// Public: code digits.
    pub code: Option<CodeDigits>,
}

impl VerificationCodeCircuit {
    /// Create a circuit for trusted setup.
    ///
    /// Uses an all-zero email and salt together with the code they derive, so
    /// the dummy assignment is satisfying.
    pub fn new_empty() -> Self {
        let zeros = [Fr::from(0u64); FIELD_ELEMENTS];

        Self {
            email: Some(zeros),
            salt: Some(zeros),
            code: Some(digest_to_digits(&hash_elements(&zeros))),
        }
    }

    /// Create a circuit with a full witness for proving.
    pub fn new_with_witness(email: &str, salt: &str, code: &str) -> Result<Self, EncodingError> {
        Ok(Self {
            email: Some(string_to_field_elements(email)?),
            salt: Some(string_to_field_elements(salt)?),
            code: Some(code_to_digits(code)?),
        })
    }

    /// Create a circuit carrying only the public values.
    ///
    /// The email slot holds zeros; verification never looks at it.
    pub fn new_public(salt: &str, code: &str) -> Result<Self, EncodingError> {
        Ok(Self {
            email: Some([Fr::from(0u64); FIELD_ELEMENTS]),
            salt: Some(string_to_field_elements(salt)?),
            code: Some(code_to_digits(code)?),
        })
    }

    /// Public inputs in the order the circuit allocates them.
    pub fn public_inputs(&self) -> Option<Vec<Fr>> {
        let salt = self.salt?;
        let code = self.code?;

        let mut inputs = Vec::with_capacity(FIELD_ELEMENTS + CODE_LENGTH);
        inputs.extend_from_slice(&salt);
        inputs.extend(code.iter().map(|d| Fr::from(*d as u64)));
        Some(inputs)
    }
}

impl ConstraintSynthesizer<Fr> for VerificationCodeCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let salt_vars = (0..FIELD_ELEMENTS)
            .map(|i| {
                FpVar::new_input(cs.clone(), || {
                    self.salt.map(|s| s[i]).ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let code_vars = (0..CODE_LENGTH)
            .map(|i| {
                FpVar::new_input(cs.clone(), || {
                    self.code
                        .map(|c| Fr::from(c[i] as u64))
                        .ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let email_vars = (0..FIELD_ELEMENTS)
            .map(|i| {
                FpVar::new_witness(cs.clone(), || {
                    self.email.map(|e| e[i]).ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut mimc = MimcGadget::new();
        for (email_var, salt_var) in email_vars.iter().zip(salt_vars.iter()) {
            let mixed = xor_elements(email_var, salt_var)?;
            mimc.absorb(&mixed)?;
        }

        let digest_bits = mimc.finalize().to_bits_le()?;

        // Nibbles from bit 23 down to bit 0.
        for (group, code_var) in code_vars.iter().enumerate() {
            let top = CODE_BITS - 1 - 4 * group;
            let nibble = nibble_from_bits(&digest_bits[top - 3..=top]);
            nibble.enforce_equal(code_var)?;
        }

        Ok(())
    }
}

/// Bitwise XOR of two field elements, recombined into a field element.
fn xor_elements(a: &FpVar<Fr>, b: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let a_bits = a.to_bits_le()?;
    let b_bits = b.to_bits_le()?;

    let mut power = Fr::from(1u64);
    let mut acc = FpVar::zero();
    for (a_bit, b_bit) in a_bits.iter().zip(b_bits.iter()) {
        let bit = a_bit.xor(b_bit)?;
        acc = acc + FpVar::from(bit) * power;
        power.double_in_place();
    }
    Ok(acc)
}

/// Recombine four little-endian bits into a value in 0..16.
fn nibble_from_bits(bits: &[Boolean<Fr>]) -> FpVar<Fr> {
    bits.iter()
        .enumerate()
        .fold(FpVar::zero(), |acc, (shift, bit)| {
            acc + FpVar::from(bit.clone()) * Fr::from(1u64 << shift)
        })
}
