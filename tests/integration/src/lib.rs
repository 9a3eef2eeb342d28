//! Shared fixtures for the cross-crate scenarios in `tests/`.

use std::sync::Arc;

use plutor_core::{IdentityConfig, ProfileData};
use plutor_onboarding::{CreatedUser, IdentityLifecycleManager, ManualClock};
use plutor_store::IdentityStore;

/// Real base58 Solana public keys (32 bytes each).
pub const WALLETS: [&str; 4] = [
    "7EcDhSYGxXyscszYEp35KHN8vvw3svAuLKTzXwCFLtV",
    "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
    "11111111111111111111111111111111",
    "So11111111111111111111111111111111111111112",
];

/// A manager over `store` driven by a manual clock.
pub fn manager_with_clock(store: IdentityStore) -> (Arc<IdentityLifecycleManager>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let manager =
        IdentityLifecycleManager::with_clock(store, IdentityConfig::default(), clock.clone())
            .expect("default identity config is valid");
    (Arc::new(manager), clock)
}

/// An in-memory manager driven by a manual clock.
pub fn memory_manager() -> (Arc<IdentityLifecycleManager>, Arc<ManualClock>) {
    manager_with_clock(IdentityStore::memory())
}

pub fn company(name: &str) -> ProfileData {
    ProfileData {
        company_name: name.to_string(),
        country: Some("US".into()),
        ..Default::default()
    }
}

/// Register, verify by token and complete a profile.
pub async fn onboard(
    manager: &IdentityLifecycleManager,
    wallet: &str,
    email: &str,
    company_name: &str,
) -> CreatedUser {
    let created = manager
        .create_user(wallet, email)
        .await
        .expect("create user");
    assert!(manager
        .verify_email(&created.verification_token)
        .await
        .expect("verify email"));
    manager
        .complete_user_profile(created.user.id, company(company_name))
        .await
        .expect("complete profile");
    tracing::debug!(did = %created.did, "fixture onboarded");
    created
}
