//! Groth16 proof verification for verification codes.
//!
//! Verification needs only the code, the salt and the proof. The email never
//! enters this module.

use ark_bn254::Bn254;
use ark_groth16::{Groth16, PreparedVerifyingKey, VerifyingKey};
use ark_snark::SNARK;

use crate::circuit::VerificationCodeCircuit;
use crate::error::CryptoError;
use crate::models::{KeyPairId, VerificationProof};
use crate::prover::VerificationCodeProof;

/// Result type for verifier operations.
pub type VerifierResult<T> = Result<T, CryptoError>;

/// Verifier for verification code proofs.
pub struct Verifier {
    key_pair_id: KeyPairId,
    /// Prepared verifying key for fast verification.
    prepared_vk: PreparedVerifyingKey<Bn254>,
    /// Original verifying key (for publication).
    verifying_key: VerifyingKey<Bn254>,
}

impl Verifier {
    /// Create a new verifier from a verifying key.
    pub fn new(key_pair_id: KeyPairId, vk: VerifyingKey<Bn254>) -> VerifierResult<Self> {
        let prepared_vk = Groth16::<Bn254>::process_vk(&vk)
            .map_err(|e| CryptoError::Verification(e.to_string()))?;
        Ok(Self {
            key_pair_id,
            prepared_vk,
            verifying_key: vk,
        })
    }

    /// Verify that `proof_bytes` proves knowledge of an email deriving `code` from `salt`.
    pub fn verify(&self, code: &str, salt: &str, proof_bytes: &[u8]) -> VerifierResult<()> {
        let proof = VerificationCodeProof::from_bytes(proof_bytes)?;
        self.verify_proof(code, salt, &proof)
    }

    /// Verify an already decoded proof.
    pub fn verify_proof(
        &self,
        code: &str,
        salt: &str,
        proof: &VerificationCodeProof,
    ) -> VerifierResult<()> {
        let public_inputs = VerificationCodeCircuit::new_public(salt, code)?
            .public_inputs()
            .ok_or_else(|| CryptoError::Verification("missing public inputs".to_string()))?;

        let valid =
            Groth16::<Bn254>::verify_with_processed_vk(&self.prepared_vk, &public_inputs, &proof.proof)
                .map_err(|e| CryptoError::Verification(e.to_string()))?;

        if valid {
            Ok(())
        } else {
            Err(CryptoError::InvalidProof)
        }
    }

    /// Verify a stored proof record, checking it was made under this verifier's keys.
    pub fn verify_record(&self, record: &VerificationProof, salt: &str) -> VerifierResult<()> {
        if record.key_pair_id != self.key_pair_id {
            return Err(CryptoError::KeyPairMismatch {
                proof: record.key_pair_id,
                loaded: self.key_pair_id,
            });
        }
        self.verify(&record.consumed_code, salt, &record.proof)
    }

    /// Key pair this verifier was built from.
    pub fn key_pair_id(&self) -> KeyPairId {
        self.key_pair_id
    }

    /// Get a reference to the verifying key.
    pub fn verifying_key(&self) -> &VerifyingKey<Bn254> {
        &self.verifying_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::Prover;
    use crate::setup::run_setup;
    use crate::test_support::{shared_keys, EMAIL, SALT};
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn proof_bytes(code: &str) -> Vec<u8> {
        let keys = shared_keys();
        let prover = Prover::new(keys.key_pair_id, keys.proving_key.clone());
        let mut rng = StdRng::seed_from_u64(0xCAFEBABE);
        prover.prove(EMAIL, SALT, code, &mut rng).unwrap().to_bytes().unwrap()
    }

    fn verifier() -> Verifier {
        let keys = shared_keys();
        Verifier::new(keys.key_pair_id, keys.verifying_key.clone()).unwrap()
    }

    #[test]
    fn test_verify_valid_proof() {
        let bytes = proof_bytes("724b2c");
        verifier().verify("724b2c", SALT, &bytes).unwrap();
    }

    #[test]
    fn test_verify_with_altered_code() {
        let bytes = proof_bytes("724b2c");
        let verifier = verifier();

        for code in ["724b2d", "024b2c", "724c2c"] {
            assert!(matches!(
                verifier.verify(code, SALT, &bytes),
                Err(CryptoError::InvalidProof)
            ));
        }
    }

    #[test]
    fn test_verify_with_other_salt() {
        let bytes = proof_bytes("724b2c");
        assert!(verifier().verify("724b2c", "anothersalt", &bytes).is_err());
    }

    #[test]
    fn test_verify_rejects_malformed_code() {
        let bytes = proof_bytes("724b2c");
        assert!(matches!(
            verifier().verify("724B2C", SALT, &bytes),
            Err(CryptoError::Encoding(_))
        ));
    }

    #[test]
    fn test_verify_truncated_proof() {
        let bytes = proof_bytes("724b2c");
        assert!(verifier().verify("724b2c", SALT, &bytes[..bytes.len() - 1]).is_err());
        assert!(verifier().verify("724b2c", SALT, &[]).is_err());
    }

    #[test]
    fn test_verify_corrupted_proof() {
        let mut bytes = proof_bytes("724b2c");
        bytes[5] ^= 0x01;
        assert!(verifier().verify("724b2c", SALT, &bytes).is_err());
    }

    #[test]
    fn test_verify_garbage_proof() {
        let garbage: Vec<u8> = (0..164).map(|i| i as u8).collect();
        assert!(verifier().verify("123456", SALT, &garbage).is_err());
    }

    #[test]
    fn test_verify_record_key_pair_mismatch() {
        let record = VerificationProof {
            proof: proof_bytes("724b2c"),
            key_pair_id: shared_keys().key_pair_id + 1,
            consumed_code: "724b2c".to_string(),
        };
        assert!(matches!(
            verifier().verify_record(&record, SALT),
            Err(CryptoError::KeyPairMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_record() {
        let record = VerificationProof {
            proof: proof_bytes("724b2c"),
            key_pair_id: shared_keys().key_pair_id,
            consumed_code: "724b2c".to_string(),
        };
        verifier().verify_record(&record, SALT).unwrap();
    }

    #[test]
    fn test_verify_with_keys_from_other_setup() {
        let bytes = proof_bytes("724b2c");

        let mut rng = StdRng::seed_from_u64(0x0BADC0DE);
        let (_, _, other_vk) = run_setup(&mut rng).unwrap();
        let other = Verifier::new(2, other_vk).unwrap();

        assert!(other.verify("724b2c", SALT, &bytes).is_err());
    }
}
