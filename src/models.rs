//! Records exchanged with the storage collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a user record.
pub type UserId = u64;

/// Identifier of a persisted Groth16 key pair.
pub type KeyPairId = u64;

/// The slice of a user record this crate needs.
///
/// The email address is deliberately absent: it is supplied per call and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Name used to greet the user in the verification email.
    pub username: String,
    /// Per-user salt mixed into the verification code.
    pub salt: String,
}

/// A pending email verification for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSession {
    pub user_id: UserId,
    /// Six lowercase hex characters.
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationSession {
    /// A session is stale from its expiry instant onwards.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Groth16 keys produced by one trusted setup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub id: KeyPairId,
    /// Compressed canonical serialization of the proving key.
    pub proving_key: Vec<u8>,
    /// Compressed canonical serialization of the verifying key.
    pub verifying_key: Vec<u8>,
    /// Fingerprint of the circuit the keys were generated for.
    pub circuit_fingerprint: String,
}

/// Key material of a setup run that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewKeyPair {
    pub proving_key: Vec<u8>,
    pub verifying_key: Vec<u8>,
    pub circuit_fingerprint: String,
}

impl NewKeyPair {
    /// Attach the identifier assigned by storage.
    pub fn with_id(self, id: KeyPairId) -> KeyPair {
        KeyPair {
            id,
            proving_key: self.proving_key,
            verifying_key: self.verifying_key,
            circuit_fingerprint: self.circuit_fingerprint,
        }
    }
}

/// Proof of a completed verification, stored on the user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationProof {
    pub proof: Vec<u8>,
    pub key_pair_id: KeyPairId,
    pub consumed_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_session_expiry_boundary() {
        let created = Utc.with_ymd_and_hms(2024, 5, 24, 14, 0, 0).unwrap();
        let session = VerificationSession {
            user_id: 1,
            code: "724b2c".to_string(),
            expires_at: created + Duration::seconds(120),
        };

        assert!(!session.is_expired_at(created));
        assert!(!session.is_expired_at(created + Duration::seconds(119)));
        assert!(session.is_expired_at(created + Duration::seconds(120)));
        assert!(session.is_expired_at(created + Duration::seconds(121)));
    }
}
