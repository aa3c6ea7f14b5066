//! Groth16 proof generation for verification codes.

use std::time::Instant;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, ProvingKey};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};

use crate::circuit::VerificationCodeCircuit;
use crate::error::CryptoError;
use crate::models::KeyPairId;

/// Result type for prover operations.
pub type ProverResult<T> = Result<T, CryptoError>;

/// Groth16 proof that some email derives a code from a salt.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationCodeProof {
    pub proof: ark_groth16::Proof<Bn254>,
}

impl VerificationCodeProof {
    /// Serialize proof to bytes.
    pub fn to_bytes(&self) -> ProverResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| CryptoError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize proof from bytes. The whole input must be consumed.
    pub fn from_bytes(bytes: &[u8]) -> ProverResult<Self> {
        let mut reader = bytes;
        let proof = ark_groth16::Proof::<Bn254>::deserialize_compressed(&mut reader)
            .map_err(|e| CryptoError::Serialization(e.to_string()))?;

        if !reader.is_empty() {
            return Err(CryptoError::Serialization(format!(
                "{} trailing bytes after proof",
                reader.len()
            )));
        }

        Ok(Self { proof })
    }
}

/// Prover holding the proving key of one key pair.
pub struct Prover {
    key_pair_id: KeyPairId,
    proving_key: ProvingKey<Bn254>,
}

impl Prover {
    pub fn new(key_pair_id: KeyPairId, proving_key: ProvingKey<Bn254>) -> Self {
        Self {
            key_pair_id,
            proving_key,
        }
    }

    /// Prove that `email` derives `code` under `salt`.
    ///
    /// The witness is checked against the circuit first, so a wrong code is
    /// reported as [`CryptoError::UnsatisfiedWitness`] instead of yielding a
    /// proof that would never verify.
    pub fn prove<R: RngCore + CryptoRng>(
        &self,
        email: &str,
        salt: &str,
        code: &str,
        rng: &mut R,
    ) -> ProverResult<VerificationCodeProof> {
        let circuit = VerificationCodeCircuit::new_with_witness(email, salt, code)?;

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit
            .clone()
            .generate_constraints(cs.clone())
            .map_err(|e| CryptoError::Synthesis(e.to_string()))?;
        let satisfied = cs
            .is_satisfied()
            .map_err(|e| CryptoError::Synthesis(e.to_string()))?;
        if !satisfied {
            tracing::debug!(key_pair_id = self.key_pair_id, "witness does not satisfy circuit");
            return Err(CryptoError::UnsatisfiedWitness);
        }

        let started = Instant::now();
        let proof = Groth16::<Bn254>::prove(&self.proving_key, circuit, rng)
            .map_err(|e| CryptoError::Proving(e.to_string()))?;

        tracing::debug!(
            key_pair_id = self.key_pair_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated verification proof"
        );

        Ok(VerificationCodeProof { proof })
    }

    /// Key pair this prover was built from.
    pub fn key_pair_id(&self) -> KeyPairId {
        self.key_pair_id
    }
}
