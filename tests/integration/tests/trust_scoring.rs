//! Integration test: trust score engine and its persistence through the
//! lifecycle manager.

use plutor_core::{VerificationFacts, VerificationStatus};
use plutor_identity::{calculate_trust_score, verification_status, TrustAssessment};
use plutor_integration_tests::{memory_manager, onboard, WALLETS};
use plutor_onboarding::OnboardingError;

fn facts(
    email: bool,
    domain: bool,
    business: bool,
    invoices: u32,
    rate: Option<f64>,
) -> VerificationFacts {
    VerificationFacts {
        email_verified: email,
        domain_verified: domain,
        business_verified: business,
        invoice_count: invoices,
        on_time_payment_rate: rate,
    }
}

// =========================================================================
// Engine properties
// =========================================================================

#[test]
fn test_score_stays_in_range_and_tiers_are_monotonic() {
    let mut observed = Vec::new();
    for mask in 0..8u8 {
        for invoices in [0, 1, 7, 20, 500] {
            for rate in [None, Some(0.0), Some(0.33), Some(1.0)] {
                let f = facts(mask & 1 != 0, mask & 2 != 0, mask & 4 != 0, invoices, rate);
                let score = calculate_trust_score(&f);
                assert!(score <= 100);
                assert_eq!(score, calculate_trust_score(&f));
                observed.push((score, verification_status(score)));
            }
        }
    }

    observed.sort();
    for pair in observed.windows(2) {
        assert!(pair[0].1 <= pair[1].1, "tier decreased at {:?}", pair);
    }
}

#[test]
fn test_payment_rate_needs_invoice_history() {
    let without_history = facts(true, false, false, 0, Some(1.0));
    assert_eq!(calculate_trust_score(&without_history), 20);

    let with_history = facts(true, false, false, 1, Some(1.0));
    // 20 + 0.5 + 15
    assert_eq!(calculate_trust_score(&with_history), 36);
}

#[test]
fn test_tier_thresholds() {
    assert_eq!(verification_status(29), VerificationStatus::Unverified);
    assert_eq!(verification_status(30), VerificationStatus::Basic);
    assert_eq!(verification_status(50), VerificationStatus::Verified);
    assert_eq!(verification_status(70), VerificationStatus::FullyVerified);
}

// =========================================================================
// Through the manager
// =========================================================================

#[tokio::test]
async fn test_full_facts_reach_fully_verified() {
    let (manager, _clock) = memory_manager();
    let created = onboard(&manager, WALLETS[0], "a@x.com", "Acme Freight").await;

    let metadata = manager
        .update_trust_score(created.user.id, facts(true, true, true, 10, Some(1.0)))
        .await
        .unwrap();
    assert_eq!(metadata.trust_score, 95);
    assert_eq!(metadata.verification_status, VerificationStatus::FullyVerified);

    let public = manager.get_public_profile(&created.did).unwrap().unwrap();
    assert_eq!(public.trust_score, Some(95));
    assert_eq!(
        public.verification_status,
        Some(VerificationStatus::FullyVerified)
    );
}

#[tokio::test]
async fn test_stored_score_matches_engine() {
    let (manager, _clock) = memory_manager();
    let created = manager.create_user(WALLETS[0], "a@x.com").await.unwrap();

    let inputs = [
        facts(true, false, true, 3, Some(0.5)),
        facts(false, true, false, 0, None),
        facts(true, true, false, 40, Some(0.9)),
    ];
    for input in inputs {
        let expected = TrustAssessment::from_facts(&input);
        let metadata = manager
            .update_trust_score(created.user.id, input)
            .await
            .unwrap();
        assert_eq!(metadata.trust_score, expected.score);
        assert_eq!(metadata.verification_status, expected.status);
        assert_eq!(metadata.verification_data, Some(input));
    }
}

#[tokio::test]
async fn test_milestones_are_kept_once_reached() {
    let (manager, _clock) = memory_manager();
    let created = manager.create_user(WALLETS[0], "a@x.com").await.unwrap();

    let first = manager
        .update_trust_score(created.user.id, facts(false, false, true, 0, None))
        .await
        .unwrap();
    let reached = first.business_verified_at.unwrap();

    let second = manager
        .update_trust_score(created.user.id, facts(false, false, false, 0, None))
        .await
        .unwrap();
    assert_eq!(second.trust_score, 0);
    assert_eq!(second.business_verified_at, Some(reached));
}

#[tokio::test]
async fn test_invalid_rate_is_rejected_without_writing() {
    let (manager, _clock) = memory_manager();
    let created = manager.create_user(WALLETS[0], "a@x.com").await.unwrap();

    let result = manager
        .update_trust_score(created.user.id, facts(true, true, true, 5, Some(-0.1)))
        .await;
    assert!(matches!(result, Err(OnboardingError::ValidationError(_))));

    let metadata = manager.get_did_metadata(created.user.id).unwrap().unwrap();
    assert_eq!(metadata.trust_score, 0);
    assert!(metadata.verification_data.is_none());
}
