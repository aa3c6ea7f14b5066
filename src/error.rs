//! Error taxonomy for code derivation, proving and the verification session.
//!
//! None of these messages carry the email address, the salt or the expected
//! verification code, so they are safe to log and to hand back to callers.

use crate::models::UserId;

/// Result type for verification session operations.
pub type VerificationResult<T> = Result<T, VerificationError>;

/// Errors raised while packing strings or codes into circuit-shaped values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("Input of {chars} characters exceeds the encoder capacity of {capacity}")]
    InputTooLong { chars: usize, capacity: usize },

    #[error("Verification code must have {expected} characters, got {len}")]
    InvalidCodeLength { len: usize, expected: usize },

    #[error("Invalid character at index {index} of the verification code")]
    InvalidCodeCharacter { index: usize },
}

/// Errors raised by the MiMC byte writer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashError {
    #[error("Input length {0} is not a multiple of the block size")]
    MisalignedInput(usize),

    #[error("Block {0} is not a canonical field element")]
    NonCanonicalBlock(usize),
}

/// Errors from witness construction, proving and verification.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Hashing failed: {0}")]
    Hash(#[from] HashError),

    #[error("Witness does not satisfy the verification circuit")]
    UnsatisfiedWitness,

    #[error("Constraint synthesis failed: {0}")]
    Synthesis(String),

    #[error("Proof generation failed: {0}")]
    Proving(String),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Proof is invalid")]
    InvalidProof,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Proof was generated under key pair {proof} but the loaded key pair is {loaded}")]
    KeyPairMismatch { proof: u64, loaded: u64 },
}

/// Errors reported by the storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Verification session for user {0} was already consumed or replaced")]
    SessionConsumed(UserId),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors reported by the mail collaborator.
#[derive(Debug, thiserror::Error)]
#[error("Failed to send verification email: {0}")]
pub struct MailError(pub String);

/// Errors from the verification session orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("No verification session found for user {0}")]
    NotFound(UserId),

    #[error("The verification code is expired. Please run the verification process again")]
    Expired,

    #[error("Invalid verification code")]
    Mismatch,

    #[error(transparent)]
    Crypto(CryptoError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

impl From<CryptoError> for VerificationError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Encoding(e) => Self::Encoding(e),
            other => Self::Crypto(other),
        }
    }
}

impl VerificationError {
    /// Expected rejections the caller should render to the user as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Encoding(_) | Self::NotFound(_) | Self::Expired | Self::Mismatch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_split() {
        assert!(VerificationError::Expired.is_user_facing());
        assert!(VerificationError::Mismatch.is_user_facing());
        assert!(VerificationError::NotFound(7).is_user_facing());
        assert!(!VerificationError::Crypto(CryptoError::InvalidProof).is_user_facing());
        assert!(!VerificationError::Storage(StorageError::Backend("down".into())).is_user_facing());
    }

    #[test]
    fn test_encoding_failures_stay_user_facing() {
        let err: VerificationError = CryptoError::Encoding(EncodingError::InvalidCodeCharacter { index: 0 }).into();
        assert!(matches!(err, VerificationError::Encoding(_)));

        let err: VerificationError = CryptoError::UnsatisfiedWitness.into();
        assert!(matches!(err, VerificationError::Crypto(_)));
    }

    #[test]
    fn test_messages_do_not_echo_codes() {
        let msg = VerificationError::Mismatch.to_string();
        assert_eq!(msg, "Invalid verification code");
    }
}
