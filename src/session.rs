//! Email verification sessions.
//!
//! A session moves from issued to consumed when the user submits the mailed code
//! and a proof of it is stored. A session past its expiry instant is stale; the
//! user recovers by starting a new one, which replaces the old row.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

use crate::code::CodeGenerator;
use crate::config::{Config, ConfigError};
use crate::error::{StorageError, VerificationError, VerificationResult};
use crate::mail::{verification_email, MailSender};
use crate::models::{User, UserId, VerificationProof, VerificationSession};
use crate::processor::ProofProcessor;
use crate::store::VerificationStore;

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Sequences code issuance, code confirmation and proof persistence.
pub struct EmailVerificationService {
    store: Arc<dyn VerificationStore>,
    mailer: Arc<dyn MailSender>,
    codes: Arc<dyn CodeGenerator>,
    proofs: Arc<dyn ProofProcessor>,
    config: Config,
    validity: chrono::Duration,
    clock: Clock,
}

impl EmailVerificationService {
    pub fn new(
        config: Config,
        store: Arc<dyn VerificationStore>,
        mailer: Arc<dyn MailSender>,
        codes: Arc<dyn CodeGenerator>,
        proofs: Arc<dyn ProofProcessor>,
    ) -> Result<Self, ConfigError> {
        let validity = chrono::Duration::from_std(config.code_validity).map_err(|e| ConfigError::Invalid {
            name: "code_validity",
            reason: e.to_string(),
        })?;

        Ok(Self {
            store,
            mailer,
            codes,
            proofs,
            config,
            validity,
            clock: Arc::new(Utc::now),
        })
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Mail a fresh code to `email` and record it as the user's pending session.
    pub fn start_verification(&self, user: &User, email: &str) -> VerificationResult<()> {
        let code = self.codes.generate_code(user, email)?;

        let message = verification_email(
            &self.config.admin_email,
            &self.config.sender_display_name,
            email,
            &user.username,
            &code,
        );
        self.mailer.send(&message).map_err(|e| {
            tracing::warn!(user_id = user.id, error = %e, "failed to send verification email");
            e
        })?;

        let now = (self.clock)();
        let expires_at = now
            .checked_add_signed(self.validity)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.store.upsert_session(VerificationSession {
            user_id: user.id,
            code,
            expires_at,
        })?;

        tracing::info!(user_id = user.id, %expires_at, "verification code issued");
        Ok(())
    }

    /// Check a submitted code against the user's pending session.
    ///
    /// A failed check leaves the session in place, so the user may retry until it expires.
    pub fn submit_code(&self, user: &User, submitted: &str) -> VerificationResult<VerificationSession> {
        let session = self.live_session(user)?;

        if !codes_match(submitted, &session.code) {
            tracing::info!(user_id = user.id, "verification code mismatch");
            return Err(VerificationError::Mismatch);
        }

        Ok(session)
    }

    /// Pending session of `user` that has not expired yet.
    fn live_session(&self, user: &User) -> VerificationResult<VerificationSession> {
        let session = match self.store.session(user.id) {
            Ok(session) => session,
            Err(StorageError::NotFound(_)) => return Err(VerificationError::NotFound(user.id)),
            Err(e) => return Err(e.into()),
        };

        if session.is_expired_at((self.clock)()) {
            tracing::info!(user_id = user.id, "verification code expired");
            return Err(VerificationError::Expired);
        }

        Ok(session)
    }

    /// Prove the confirmed code and store the proof, consuming the session.
    ///
    /// An expired session is refused before any proving work. When proving or
    /// storage fails the session is untouched and the call can be repeated.
    pub fn finalize_proof(
        &self,
        user: &User,
        email: &str,
        submitted: &str,
    ) -> VerificationResult<VerificationProof> {
        self.live_session(user)?;

        let (proof, key_pair_id) = self
            .proofs
            .generate_proof(email, &user.salt, submitted)
            .map_err(|e| {
                tracing::error!(user_id = user.id, error = %e, "failed to generate verification proof");
                e
            })?;

        let record = VerificationProof {
            proof,
            key_pair_id,
            consumed_code: submitted.to_string(),
        };

        self.store
            .finalize_verification(user.id, record.clone())
            .map_err(|e| {
                tracing::error!(user_id = user.id, error = %e, "failed to store verification proof");
                e
            })?;

        tracing::info!(user_id = user.id, key_pair_id, "email verified");
        Ok(record)
    }

    /// Confirm a submitted code and, on success, materialize its proof.
    pub fn check_verification_code(
        &self,
        user: &User,
        submitted: &str,
        email: &str,
    ) -> VerificationResult<VerificationProof> {
        self.submit_code(user, submitted)?;
        self.finalize_proof(user, email, submitted)
    }

    /// Check a proof produced earlier. Needs no email.
    pub fn verify_stored_proof(&self, code: &str, salt: &str, proof: &[u8]) -> VerificationResult<()> {
        self.proofs.verify_proof(code, salt, proof)?;
        Ok(())
    }

    /// Whether the user completed a verification.
    pub fn is_email_verified(&self, user_id: UserId) -> VerificationResult<bool> {
        Ok(self.store.is_email_verified(user_id)?)
    }
}

fn codes_match(submitted: &str, expected: &str) -> bool {
    submitted.as_bytes().ct_eq(expected.as_bytes()).into()
}
