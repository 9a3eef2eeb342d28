//! Plutor Onboarding
//!
//! The identity lifecycle manager: registers wallets, mints DIDs, issues and
//! confirms email verifications, records business profiles and keeps each
//! user's trust score in step with their verification facts.

pub mod clock;
pub mod error;
pub mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::OnboardingError;
pub use manager::{CreatedUser, IdentityLifecycleManager, DEFAULT_SEARCH_LIMIT};
