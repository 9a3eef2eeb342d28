use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lower bound on token entropy, in bytes.
pub const MIN_TOKEN_BYTES: usize = 16;
/// Longest allowed verification lifetime: one year.
pub const MAX_VERIFICATION_TTL_HOURS: i64 = 24 * 365;

/// Identity settings shared by the lifecycle manager and the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// DID method segment (`did:<method>:<identifier>`).
    #[serde(default = "default_did_method")]
    pub did_method: String,
    /// How long an email verification code/token stays valid, in hours.
    #[serde(default = "default_verification_ttl_hours")]
    pub verification_ttl_hours: i64,
    /// Random bytes behind each URL-safe verification token.
    #[serde(default = "default_token_bytes")]
    pub token_bytes: usize,
    /// Base URL of the public profile pages, used for the DID Document service entry.
    #[serde(default = "default_profile_base_url")]
    pub profile_base_url: String,
}

fn default_did_method() -> String {
    "solana".into()
}
fn default_verification_ttl_hours() -> i64 {
    24
}
fn default_token_bytes() -> usize {
    32
}
fn default_profile_base_url() -> String {
    "http://localhost:3000".into()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            did_method: default_did_method(),
            verification_ttl_hours: default_verification_ttl_hours(),
            token_bytes: default_token_bytes(),
            profile_base_url: default_profile_base_url(),
        }
    }
}

impl IdentityConfig {
    /// Verification lifetime as a chrono duration.
    pub fn verification_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.verification_ttl_hours)
    }

    /// Reject settings that would mint malformed DIDs, guessable or colliding
    /// tokens, or verification windows that are empty or overflow the clock.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.did_method.is_empty()
            || !self
                .did_method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(CoreError::ValidationError(format!(
                "did_method must be non-empty lowercase letters or digits, got {:?}",
                self.did_method
            )));
        }
        if self.token_bytes < MIN_TOKEN_BYTES {
            return Err(CoreError::ValidationError(format!(
                "token_bytes must be at least {}, got {}",
                MIN_TOKEN_BYTES, self.token_bytes
            )));
        }
        if !(1..=MAX_VERIFICATION_TTL_HOURS).contains(&self.verification_ttl_hours) {
            return Err(CoreError::ValidationError(format!(
                "verification_ttl_hours must be within 1..={}, got {}",
                MAX_VERIFICATION_TTL_HOURS, self.verification_ttl_hours
            )));
        }
        Ok(())
    }
}
