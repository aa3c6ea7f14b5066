//! Storage contract for sessions, key pairs and proofs.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::error::StorageError;
use crate::models::{KeyPair, KeyPairId, NewKeyPair, UserId, VerificationProof, VerificationSession};

/// Persistence of Groth16 key pairs.
pub trait KeyPairStore: Send + Sync {
    /// Most recently saved key pair.
    fn latest_key_pair(&self) -> Result<KeyPair, StorageError>;

    /// Persist a key pair and return its identifier. Identifiers increase with every save.
    fn save_key_pair(&self, key_pair: NewKeyPair) -> Result<KeyPairId, StorageError>;
}

/// Persistence required by the verification flow.
///
/// Implementations serialize mutations of one user's session: two concurrent
/// finalizations for the same session must not both succeed.
pub trait VerificationStore: KeyPairStore {
    /// Insert the session, replacing any session of the same user.
    fn upsert_session(&self, session: VerificationSession) -> Result<(), StorageError>;

    /// Pending session of a user.
    fn session(&self, user_id: UserId) -> Result<VerificationSession, StorageError>;

    /// Atomically store the proof on the user record, delete the user's session
    /// and mark the email as verified.
    ///
    /// Fails with [`StorageError::SessionConsumed`] and changes nothing when the
    /// stored session no longer carries `proof.consumed_code`.
    fn finalize_verification(
        &self,
        user_id: UserId,
        proof: VerificationProof,
    ) -> Result<(), StorageError>;

    /// Proof stored by the last successful verification.
    fn verification_proof(&self, user_id: UserId) -> Result<VerificationProof, StorageError>;

    /// Whether the user's email is marked as verified.
    fn is_email_verified(&self, user_id: UserId) -> Result<bool, StorageError>;
}

#[derive(Default)]
struct MemoryState {
    key_pairs: Vec<KeyPair>,
    sessions: HashMap<UserId, VerificationSession>,
    proofs: HashMap<UserId, VerificationProof>,
    verified: HashSet<UserId>,
}

/// In-process store. Every operation runs under one lock.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyPairStore for MemoryStore {
    fn latest_key_pair(&self) -> Result<KeyPair, StorageError> {
        self.state
            .lock()
            .key_pairs
            .last()
            .cloned()
            .ok_or(StorageError::NotFound("key pair"))
    }

    fn save_key_pair(&self, key_pair: NewKeyPair) -> Result<KeyPairId, StorageError> {
        let mut state = self.state.lock();
        let id = state.key_pairs.len() as KeyPairId + 1;
        state.key_pairs.push(key_pair.with_id(id));
        Ok(id)
    }
}

impl VerificationStore for MemoryStore {
    fn upsert_session(&self, session: VerificationSession) -> Result<(), StorageError> {
        self.state.lock().sessions.insert(session.user_id, session);
        Ok(())
    }

    fn session(&self, user_id: UserId) -> Result<VerificationSession, StorageError> {
        self.state
            .lock()
            .sessions
            .get(&user_id)
            .cloned()
            .ok_or(StorageError::NotFound("verification session"))
    }

    fn finalize_verification(
        &self,
        user_id: UserId,
        proof: VerificationProof,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock();

        match state.sessions.get(&user_id) {
            Some(session) if session.code == proof.consumed_code => {}
            _ => return Err(StorageError::SessionConsumed(user_id)),
        }

        state.sessions.remove(&user_id);
        state.proofs.insert(user_id, proof);
        state.verified.insert(user_id);
        Ok(())
    }

    fn verification_proof(&self, user_id: UserId) -> Result<VerificationProof, StorageError> {
        self.state
            .lock()
            .proofs
            .get(&user_id)
            .cloned()
            .ok_or(StorageError::NotFound("verification proof"))
    }

    fn is_email_verified(&self, user_id: UserId) -> Result<bool, StorageError> {
        Ok(self.state.lock().verified.contains(&user_id))
    }
}
