use std::fmt;

use crate::error::CoreError;

/// Where a user stands in the onboarding flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingState {
    /// No user row exists for the wallet.
    Unregistered,
    /// User, DID and pending email verification exist; email not confirmed.
    Registered,
    /// The email address has been confirmed.
    EmailVerified,
    /// The business profile has been submitted. Final state.
    ProfileCompleted,
}

impl OnboardingState {
    /// Derive the state from the persisted user flags.
    pub fn from_flags(email_verified: bool, onboarding_completed: bool) -> Self {
        match (email_verified, onboarding_completed) {
            (_, true) => Self::ProfileCompleted,
            (true, false) => Self::EmailVerified,
            (false, false) => Self::Registered,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Registered => "registered",
            Self::EmailVerified => "email_verified",
            Self::ProfileCompleted => "profile_completed",
        }
    }
}

impl fmt::Display for OnboardingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that move a user through onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingEvent {
    /// Wallet and email registered, DID minted.
    Register,
    /// A verification code or token was consumed.
    VerifyEmail,
    /// The business profile was submitted.
    CompleteProfile,
}

/// Onboarding transitions.
///
/// Valid transitions:
/// - Unregistered → Registered (Register)
/// - Registered → EmailVerified (VerifyEmail)
/// - EmailVerified → ProfileCompleted (CompleteProfile)
pub struct OnboardingStateMachine;

impl OnboardingStateMachine {
    /// Attempt a transition. Returns the new state, or an error for
    /// out-of-order or repeated events.
    pub fn transition(
        current: OnboardingState,
        event: OnboardingEvent,
    ) -> Result<OnboardingState, CoreError> {
        let new_state = match (current, event) {
            (OnboardingState::Unregistered, OnboardingEvent::Register) => {
                OnboardingState::Registered
            }
            (OnboardingState::Registered, OnboardingEvent::VerifyEmail) => {
                OnboardingState::EmailVerified
            }
            (OnboardingState::EmailVerified, OnboardingEvent::CompleteProfile) => {
                OnboardingState::ProfileCompleted
            }
            _ => {
                let target = match event {
                    OnboardingEvent::Register => OnboardingState::Registered,
                    OnboardingEvent::VerifyEmail => OnboardingState::EmailVerified,
                    OnboardingEvent::CompleteProfile => OnboardingState::ProfileCompleted,
                };
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    to: target,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "onboarding state transition"
        );

        Ok(new_state)
    }

    pub fn can_transition(current: OnboardingState, event: OnboardingEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
