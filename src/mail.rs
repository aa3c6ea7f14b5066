//! Mail delivery contract and the verification email.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::MailError;

/// Subject line of the verification email.
pub const VERIFICATION_SUBJECT: &str = "Verify your email at the Layer8 service";

/// An outgoing email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub from_display_name: String,
    pub to: String,
    pub to_display_name: String,
    pub subject: String,
    pub body: String,
}

/// Delivers email. Implementations impose their own send timeouts.
pub trait MailSender: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Build the email carrying a verification code.
pub fn verification_email(
    from: &str,
    from_display_name: &str,
    to: &str,
    username: &str,
    code: &str,
) -> EmailMessage {
    EmailMessage {
        from: from.to_string(),
        from_display_name: from_display_name.to_string(),
        to: to.to_string(),
        to_display_name: username.to_string(),
        subject: VERIFICATION_SUBJECT.to_string(),
        body: format!(
            "Hello {},\n\nYour email verification code is {}.\n\
             It expires shortly; request a new one if it does.\n",
            username, code
        ),
    }
}

/// Keeps sent messages in memory.
#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<EmailMessage>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().clone()
    }

    /// Most recent message to `to`.
    pub fn last_to(&self, to: &str) -> Option<EmailMessage> {
        self.sent.lock().iter().rev().find(|m| m.to == to).cloned()
    }
}

impl MailSender for Outbox {
    fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        self.sent.lock().push(message.clone());
        Ok(())
    }
}
