//! Plutor Core: fundamental types, errors, and configuration for the
//! Plutor business identity and trust-scoring service.

pub mod config;
pub mod error;
pub mod onboarding_state;
pub mod types;
pub mod validation;

pub use config::IdentityConfig;
pub use error::CoreError;
pub use onboarding_state::{OnboardingEvent, OnboardingState, OnboardingStateMachine};
pub use types::{
    DidMetadata, EmailVerification, Profile, ProfileData, ProfileUpdate, PublicProfile, User,
    UserId, UserRecord, VerificationFacts, VerificationStatus,
};
