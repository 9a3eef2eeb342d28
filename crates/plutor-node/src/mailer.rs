use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plutor_core::UserId;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// An email verification ready to be delivered.
#[derive(Debug, Clone)]
pub struct VerificationMessage {
    pub user_id: UserId,
    pub email: String,
    pub code: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Delivery channel for email verifications.
///
/// Registration has already committed when this is called; a delivery
/// failure is logged and does not undo it.
#[async_trait]
pub trait VerificationMailer: Send + Sync {
    async fn send_verification(&self, message: &VerificationMessage) -> Result<(), MailerError>;

    /// Short name for logs (e.g. "log").
    fn name(&self) -> &str;
}

/// Writes the code to the log instead of sending mail. For development.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl VerificationMailer for LogMailer {
    async fn send_verification(&self, message: &VerificationMessage) -> Result<(), MailerError> {
        tracing::info!(
            user_id = %message.user_id,
            email = %message.email,
            code = %message.code,
            expires_at = %message.expires_at,
            "verification code issued"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Keeps every message in memory so callers can read codes back.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<VerificationMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent message sent to `email`.
    pub fn last_for(&self, email: &str) -> Option<VerificationMessage> {
        self.outbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .find(|m| m.email == email)
            .cloned()
    }

    pub fn sent(&self) -> usize {
        self.outbox.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl VerificationMailer for MemoryMailer {
    async fn send_verification(&self, message: &VerificationMessage) -> Result<(), MailerError> {
        self.outbox
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
