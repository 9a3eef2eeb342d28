use plutor_core::{CoreError, OnboardingState};
use plutor_identity::IdentityError;
use plutor_store::StoreError;

/// Lifecycle errors. Every variant means nothing was written.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("a user with wallet {0} already exists")]
    DuplicateWallet(String),

    #[error("email {0} is already registered")]
    DuplicateEmail(String),

    /// Absent, expired and already-consumed verifications are reported the
    /// same way.
    #[error("verification not found")]
    VerificationNotFound,

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("profile not found for user {0}")]
    ProfileNotFound(String),

    #[error("DID metadata not found for user {0}")]
    DidMetadataNotFound(String),

    #[error("invalid onboarding transition from {from} to {to}")]
    InvalidStateTransition {
        from: OnboardingState,
        to: OnboardingState,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for OnboardingError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidStateTransition { from, to } => {
                Self::InvalidStateTransition { from, to }
            }
            CoreError::MissingField(field) => {
                Self::ValidationError(format!("missing required field: {}", field))
            }
            CoreError::ValidationError(msg) => Self::ValidationError(msg),
        }
    }
}

impl From<IdentityError> for OnboardingError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidAddress(msg) => Self::InvalidAddress(msg),
            IdentityError::Serialization(e) => Self::Internal(e.to_string()),
        }
    }
}
