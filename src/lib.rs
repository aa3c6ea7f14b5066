//! zk-email-verify - Prove an email was verified without keeping the email
//!
//! A user receives a six-character code derived from their email address and a
//! per-user salt. Once they submit it, a Groth16 proof is stored that binds the
//! code and the salt to *some* email without recording which one.
//!
//! # Architecture
//!
//! 1. `encoding` packs strings into BN254 field elements
//! 2. `code` derives the code with MiMC over `email XOR salt`
//! 3. `circuit` models the same derivation as R1CS constraints
//! 4. `setup` runs the Groth16 ceremony and binds keys to the circuit
//! 5. `prover` / `verifier` / `processor` generate and check proofs
//! 6. `session` drives issuance, confirmation and proof persistence
//!
//! Anyone holding the code, the salt and the proof can later re-check the
//! verification with the published verifying key.

pub mod circuit;
pub mod code;
pub mod config;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod mail;
pub mod mimc;
pub mod models;
pub mod processor;
pub mod prover;
pub mod session;
pub mod setup;
pub mod store;
pub mod verifier;

// Re-export main types
pub use code::{generate_code, CodeGenerator, MimcCodeGenerator, RandomCodeGenerator};
pub use config::{Config, KeyConfig};
pub use error::{CryptoError, EncodingError, StorageError, VerificationError};
pub use processor::{Groth16ProofProcessor, ProofProcessor};
pub use prover::Prover;
pub use session::EmailVerificationService;
pub use setup::{bootstrap, ZkKeys};
pub use store::{KeyPairStore, MemoryStore, VerificationStore};
pub use verifier::Verifier;

#[cfg(test)]
pub(crate) mod test_support {
    //! One trusted setup shared by every proof test in the binary.

    use std::sync::OnceLock;

    use ark_std::rand::{rngs::StdRng, SeedableRng};

    use crate::processor::Groth16ProofProcessor;
    use crate::setup::{run_setup, ZkKeys};

    pub const EMAIL: &str = "myemail@gmail.com";
    pub const SALT: &str = "ajdjsjsaafktyowqqrtgpowrkdkdkfak";

    pub fn shared_keys() -> &'static ZkKeys {
        static KEYS: OnceLock<ZkKeys> = OnceLock::new();
        KEYS.get_or_init(|| {
            let mut rng = StdRng::seed_from_u64(0x5A4B5F454D41494C);
            let (shape, proving_key, verifying_key) = run_setup(&mut rng).unwrap();
            ZkKeys {
                key_pair_id: 1,
                proving_key,
                verifying_key,
                shape,
            }
        })
    }

    pub fn shared_processor() -> &'static Groth16ProofProcessor {
        static PROCESSOR: OnceLock<Groth16ProofProcessor> = OnceLock::new();
        PROCESSOR.get_or_init(|| {
            let keys = shared_keys();
            Groth16ProofProcessor::new(ZkKeys {
                key_pair_id: keys.key_pair_id,
                proving_key: keys.proving_key.clone(),
                verifying_key: keys.verifying_key.clone(),
                shape: keys.shape,
            })
            .unwrap()
        })
    }
}
