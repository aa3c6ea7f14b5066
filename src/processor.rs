//! Proof processing seam used by the verification flow.

use rand::rngs::OsRng;

use crate::error::CryptoError;
use crate::models::KeyPairId;
use crate::prover::Prover;
use crate::setup::ZkKeys;
use crate::verifier::Verifier;

/// Generates and verifies proofs of email verification.
///
/// Verification takes no email: anyone holding the code, the salt and the
/// proof can check it.
pub trait ProofProcessor: Send + Sync {
    /// Prove that `email` derives `code` under `salt`. Returns the serialized
    /// proof and the key pair it was generated under.
    fn generate_proof(
        &self,
        email: &str,
        salt: &str,
        code: &str,
    ) -> Result<(Vec<u8>, KeyPairId), CryptoError>;

    /// Check a serialized proof against a code and salt.
    fn verify_proof(&self, code: &str, salt: &str, proof: &[u8]) -> Result<(), CryptoError>;
}

/// Groth16 processor over one immutable key pair.
pub struct Groth16ProofProcessor {
    prover: Prover,
    verifier: Verifier,
}

impl Groth16ProofProcessor {
    pub fn new(keys: ZkKeys) -> Result<Self, CryptoError> {
        Ok(Self {
            prover: Prover::new(keys.key_pair_id, keys.proving_key),
            verifier: Verifier::new(keys.key_pair_id, keys.verifying_key)?,
        })
    }

    pub fn key_pair_id(&self) -> KeyPairId {
        self.prover.key_pair_id()
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }
}

impl ProofProcessor for Groth16ProofProcessor {
    fn generate_proof(
        &self,
        email: &str,
        salt: &str,
        code: &str,
    ) -> Result<(Vec<u8>, KeyPairId), CryptoError> {
        let proof = self.prover.prove(email, salt, code, &mut OsRng)?;
        Ok((proof.to_bytes()?, self.prover.key_pair_id()))
    }

    fn verify_proof(&self, code: &str, salt: &str, proof: &[u8]) -> Result<(), CryptoError> {
        self.verifier.verify(code, salt, proof)
    }
}
