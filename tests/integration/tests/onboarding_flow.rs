//! Integration test: registration, email verification and profile
//! completion through the lifecycle manager and a real store.

use chrono::Duration;
use plutor_core::{OnboardingState, VerificationStatus};
use plutor_identity::DidCodec;
use plutor_integration_tests::{company, manager_with_clock, memory_manager, onboard, WALLETS};
use plutor_onboarding::OnboardingError;
use plutor_store::IdentityStore;

// =========================================================================
// Registration
// =========================================================================

#[tokio::test]
async fn test_registration_mints_did_and_unverified_metadata() {
    let (manager, _clock) = memory_manager();
    let created = manager.create_user(WALLETS[0], "a@x.com").await.unwrap();

    let suffix = created.did.strip_prefix("did:solana:").unwrap();
    assert!((32..=44).contains(&suffix.len()));
    assert!(DidCodec::default().is_valid_did(&created.did));

    let record = manager.get_user_by_did(&created.did).unwrap().unwrap();
    assert_eq!(record.user.wallet_address, WALLETS[0]);
    assert_eq!(record.user.onboarding_state(), OnboardingState::Registered);

    let metadata = record.did_metadata.unwrap();
    assert_eq!(metadata.trust_score, 0);
    assert_eq!(metadata.verification_status, VerificationStatus::Unverified);
    assert_eq!(metadata.did_document["controller"], created.did);
    assert_eq!(
        metadata.did_document["verificationMethod"][0]["publicKeyMultibase"],
        WALLETS[0]
    );
}

#[tokio::test]
async fn test_every_wallet_gets_distinct_did() {
    let (manager, _clock) = memory_manager();
    let mut dids = Vec::new();
    for (i, wallet) in WALLETS.iter().enumerate() {
        let created = manager
            .create_user(wallet, &format!("user{}@x.com", i))
            .await
            .unwrap();
        dids.push(created.did);
    }
    dids.sort();
    dids.dedup();
    assert_eq!(dids.len(), WALLETS.len());
}

#[tokio::test]
async fn test_duplicate_wallet_leaves_no_extra_rows() {
    let (manager, _clock) = memory_manager();
    let first = manager.create_user(WALLETS[0], "a@x.com").await.unwrap();

    let err = manager
        .create_user(WALLETS[0], "b@x.com")
        .await
        .unwrap_err();
    assert!(matches!(err, OnboardingError::DuplicateWallet(_)));

    assert!(manager.get_user_by_email("b@x.com").unwrap().is_none());
    let record = manager.get_user_by_wallet(WALLETS[0]).unwrap().unwrap();
    assert_eq!(record.user.id, first.user.id);
    assert_eq!(
        manager
            .store()
            .find_email_verifications(first.user.id)
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_concurrent_registration_of_one_wallet() {
    let (manager, _clock) = memory_manager();

    let mut handles = Vec::new();
    for i in 0..8 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager
                .create_user(WALLETS[1], &format!("racer{}@x.com", i))
                .await
        }));
    }

    let mut created = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(OnboardingError::DuplicateWallet(_)) => duplicates += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(duplicates, 7);
}

// =========================================================================
// Email verification
// =========================================================================

#[tokio::test]
async fn test_verify_by_code_scores_twenty() {
    let (manager, _clock) = memory_manager();
    let created = manager.create_user(WALLETS[0], "a@x.com").await.unwrap();

    let assessment = manager
        .verify_email_with_code(created.user.id, &created.verification_code)
        .await
        .unwrap();
    assert_eq!(assessment.score, 20);
    assert_eq!(assessment.status, VerificationStatus::Unverified);

    let user = manager.get_user_by_email("a@x.com").unwrap().unwrap();
    assert!(user.email_verified);
    assert_eq!(user.onboarding_state(), OnboardingState::EmailVerified);
}

#[tokio::test]
async fn test_double_token_verification_changes_nothing() {
    let (manager, _clock) = memory_manager();
    let created = manager.create_user(WALLETS[0], "a@x.com").await.unwrap();

    assert!(manager.verify_email(&created.verification_token).await.unwrap());
    let before = manager.get_user_by_wallet(WALLETS[0]).unwrap();

    assert!(!manager.verify_email(&created.verification_token).await.unwrap());
    assert_eq!(manager.get_user_by_wallet(WALLETS[0]).unwrap(), before);
}

#[tokio::test]
async fn test_concurrent_verification_succeeds_once() {
    let (manager, _clock) = memory_manager();
    let created = manager.create_user(WALLETS[0], "a@x.com").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = manager.clone();
        let token = created.verification_token.clone();
        handles.push(tokio::spawn(
            async move { manager.verify_email(&token).await },
        ));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);

    let verifications = manager
        .store()
        .find_email_verifications(created.user.id)
        .unwrap();
    assert!(verifications[0].verified_at.is_some());
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (manager, clock) = memory_manager();
    let created = manager.create_user(WALLETS[0], "a@x.com").await.unwrap();

    clock.advance(Duration::hours(25));
    assert!(!manager.verify_email(&created.verification_token).await.unwrap());

    let user = manager.get_user_by_email("a@x.com").unwrap().unwrap();
    assert!(!user.email_verified);
}

#[tokio::test]
async fn test_code_of_another_user_is_rejected() {
    let (manager, _clock) = memory_manager();
    let alice = manager.create_user(WALLETS[0], "a@x.com").await.unwrap();
    let bob = manager.create_user(WALLETS[1], "b@x.com").await.unwrap();

    if alice.verification_code != bob.verification_code {
        let result = manager
            .verify_email_with_code(bob.user.id, &alice.verification_code)
            .await;
        assert!(matches!(result, Err(OnboardingError::VerificationNotFound)));
    }
    assert!(!manager.get_user_by_email("b@x.com").unwrap().unwrap().email_verified);
}

// =========================================================================
// Profile completion and lookups
// =========================================================================

#[tokio::test]
async fn test_full_onboarding_then_public_profile() {
    let (manager, _clock) = memory_manager();
    let created = onboard(&manager, WALLETS[0], "a@x.com", "Acme Freight").await;

    let record = manager.get_user_by_wallet(WALLETS[0]).unwrap().unwrap();
    assert_eq!(
        record.user.onboarding_state(),
        OnboardingState::ProfileCompleted
    );
    assert_eq!(record.profile.unwrap().data.company_name, "Acme Freight");

    let public = manager.get_public_profile(&created.did).unwrap().unwrap();
    assert_eq!(public.company_name, "Acme Freight");
    assert_eq!(public.country.as_deref(), Some("US"));
    assert_eq!(public.trust_score, Some(20));
}

#[tokio::test]
async fn test_profile_cannot_be_completed_twice() {
    let (manager, _clock) = memory_manager();
    let created = onboard(&manager, WALLETS[0], "a@x.com", "Acme Freight").await;

    let result = manager
        .complete_user_profile(created.user.id, company("Other Co"))
        .await;
    assert!(matches!(
        result,
        Err(OnboardingError::InvalidStateTransition { .. })
    ));
    let profile = manager.store().find_profile(created.user.id).unwrap().unwrap();
    assert_eq!(profile.data.company_name, "Acme Freight");
}

#[tokio::test]
async fn test_search_by_company() {
    let (manager, _clock) = memory_manager();
    onboard(&manager, WALLETS[0], "a@x.com", "Acme Freight").await;
    onboard(&manager, WALLETS[1], "b@x.com", "ACME Textiles").await;
    onboard(&manager, WALLETS[2], "c@x.com", "Blue Harbor").await;

    let hits = manager.search_users_by_company("acme", 10).unwrap();
    let names: Vec<_> = hits.iter().map(|p| p.company_name.as_str()).collect();
    assert_eq!(names, vec!["Acme Freight", "ACME Textiles"]);

    assert_eq!(manager.search_users_by_company("acme", 1).unwrap().len(), 1);
}

// =========================================================================
// Persistence
// =========================================================================

#[tokio::test]
async fn test_onboarding_survives_rocksdb_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let did = {
        let (manager, _clock) = manager_with_clock(IdentityStore::open_rocksdb(dir.path()).unwrap());
        let created = onboard(&manager, WALLETS[0], "a@x.com", "Acme Freight").await;
        manager.close().await.unwrap();
        created.did
    };

    let (manager, _clock) = manager_with_clock(IdentityStore::open_rocksdb(dir.path()).unwrap());
    let record = manager.get_user_by_did(&did).unwrap().unwrap();
    assert!(record.user.email_verified);
    assert!(record.user.onboarding_completed);
    assert_eq!(record.did_metadata.unwrap().trust_score, 20);
    assert!(manager.check_user_exists(WALLETS[0]).unwrap());
}
