use crate::onboarding_state::OnboardingState;

/// Core errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid onboarding transition from {from} to {to}")]
    InvalidStateTransition {
        from: OnboardingState,
        to: OnboardingState,
    },

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}
