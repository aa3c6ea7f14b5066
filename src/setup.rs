//! Trusted setup for the verification code circuit.
//!
//! Compiling the circuit is deterministic and cheap enough to repeat on every
//! boot. The Groth16 ceremony is randomized and runs once per circuit version;
//! its keys are persisted together with a fingerprint of the circuit so that
//! keys minted for an older circuit are never loaded against a newer one.

use std::time::Instant;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisMode,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::circuit::VerificationCodeCircuit;
use crate::encoding::{CHARS_PER_ELEMENT, CODE_LENGTH, FIELD_ELEMENTS};
use crate::error::StorageError;
use crate::mimc::{MIMC_EXPONENT, MIMC_ROUNDS};
use crate::models::{KeyPair, KeyPairId, NewKeyPair};
use crate::store::KeyPairStore;

/// Result type for setup operations.
pub type SetupResult<T> = Result<T, SetupError>;

/// Errors that can occur during setup.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Constraint synthesis failed: {0}")]
    Synthesis(String),

    #[error("Trusted setup failed: {0}")]
    Ceremony(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Key pair {id} was generated for circuit {stored}, current circuit is {current}")]
    CircuitMismatch {
        id: KeyPairId,
        stored: String,
        current: String,
    },
}

/// Size of the compiled constraint system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitShape {
    pub num_constraints: usize,
    pub num_instance_variables: usize,
    pub num_witness_variables: usize,
}

impl CircuitShape {
    /// Hex SHA-256 over the shape and the hash/encoding parameters.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"verification-code-circuit/mimc-bn254");
        for value in [
            self.num_constraints,
            self.num_instance_variables,
            self.num_witness_variables,
            FIELD_ELEMENTS,
            CHARS_PER_ELEMENT,
            CODE_LENGTH,
            MIMC_ROUNDS,
            MIMC_EXPONENT as usize,
        ] {
            hasher.update((value as u64).to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Groth16 keys bound to the current circuit.
pub struct ZkKeys {
    pub key_pair_id: KeyPairId,
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
    pub shape: CircuitShape,
}

impl ZkKeys {
    /// Deserialize a persisted key pair, refusing keys minted for another circuit.
    pub fn from_key_pair(key_pair: &KeyPair, shape: CircuitShape) -> SetupResult<Self> {
        let current = shape.fingerprint();
        if key_pair.circuit_fingerprint != current {
            return Err(SetupError::CircuitMismatch {
                id: key_pair.id,
                stored: key_pair.circuit_fingerprint.clone(),
                current,
            });
        }

        let proving_key = ProvingKey::deserialize_compressed(&key_pair.proving_key[..])
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        let verifying_key = VerifyingKey::deserialize_compressed(&key_pair.verifying_key[..])
            .map_err(|e| SetupError::Serialization(e.to_string()))?;

        Ok(Self {
            key_pair_id: key_pair.id,
            proving_key,
            verifying_key,
            shape,
        })
    }
}

/// Compile the circuit and report its shape.
pub fn compile_circuit() -> SetupResult<CircuitShape> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Setup);

    VerificationCodeCircuit::new_empty()
        .generate_constraints(cs.clone())
        .map_err(|e| SetupError::Synthesis(e.to_string()))?;
    cs.finalize();

    Ok(CircuitShape {
        num_constraints: cs.num_constraints(),
        num_instance_variables: cs.num_instance_variables(),
        num_witness_variables: cs.num_witness_variables(),
    })
}

/// Run the Groth16 ceremony.
///
/// Must not run concurrently with itself; the resulting keys replace the ones
/// every later proof depends on.
pub fn run_setup<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> SetupResult<(CircuitShape, ProvingKey<Bn254>, VerifyingKey<Bn254>)> {
    let shape = compile_circuit()?;

    let started = Instant::now();
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(VerificationCodeCircuit::new_empty(), rng)
        .map_err(|e| SetupError::Ceremony(e.to_string()))?;

    tracing::info!(
        constraints = shape.num_constraints,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "groth16 setup completed"
    );

    Ok((shape, pk, vk))
}

/// Serialize keys for persistence.
pub fn serialize_keys(
    shape: &CircuitShape,
    proving_key: &ProvingKey<Bn254>,
    verifying_key: &VerifyingKey<Bn254>,
) -> SetupResult<NewKeyPair> {
    let mut pk_bytes = Vec::new();
    proving_key
        .serialize_compressed(&mut pk_bytes)
        .map_err(|e| SetupError::Serialization(e.to_string()))?;

    let mut vk_bytes = Vec::new();
    verifying_key
        .serialize_compressed(&mut vk_bytes)
        .map_err(|e| SetupError::Serialization(e.to_string()))?;

    Ok(NewKeyPair {
        proving_key: pk_bytes,
        verifying_key: vk_bytes,
        circuit_fingerprint: shape.fingerprint(),
    })
}

/// Mint a fresh key pair and persist it.
pub fn generate_and_persist<S, R>(
    store: &S,
    rng: &mut R,
) -> SetupResult<ZkKeys>
where
    S: KeyPairStore + ?Sized,
    R: RngCore + CryptoRng,
{
    let (shape, proving_key, verifying_key) = run_setup(rng)?;
    let key_pair_id = store.save_key_pair(serialize_keys(&shape, &proving_key, &verifying_key)?)?;

    tracing::info!(key_pair_id, fingerprint = %shape.fingerprint(), "persisted new zk key pair");

    Ok(ZkKeys {
        key_pair_id,
        proving_key,
        verifying_key,
        shape,
    })
}

/// Recompile the circuit and load the latest persisted key pair.
pub fn load_latest<S: KeyPairStore + ?Sized>(store: &S) -> SetupResult<ZkKeys> {
    let shape = compile_circuit()?;
    let key_pair = store.latest_key_pair()?;
    let keys = ZkKeys::from_key_pair(&key_pair, shape)?;

    tracing::info!(key_pair_id = keys.key_pair_id, "loaded zk key pair");
    Ok(keys)
}

/// Startup entry point: mint new keys when asked to, otherwise load the latest.
pub fn bootstrap<S: KeyPairStore + ?Sized>(store: &S, generate_new_keys: bool) -> SetupResult<ZkKeys> {
    if generate_new_keys {
        generate_and_persist(store, &mut OsRng)
    } else {
        load_latest(store)
    }
}
