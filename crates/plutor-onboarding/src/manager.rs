use std::sync::Arc;

use chrono::{DateTime, Utc};
use plutor_core::validation::{
    sanitize_input, validate_email, validate_profile_data, validate_profile_update,
    validate_wallet_address,
};
use plutor_core::{
    DidMetadata, EmailVerification, IdentityConfig, OnboardingEvent, OnboardingState,
    OnboardingStateMachine, Profile, ProfileData, ProfileUpdate, PublicProfile, User, UserId,
    UserRecord, VerificationFacts,
};
use plutor_identity::{
    generate_secure_token, generate_verification_code, DidCodec, TrustAssessment,
};
use plutor_store::{IdentityStore, Records, StoreError, Transaction, UniqueField};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::OnboardingError;

/// Fresh DIDs to try when a minted DID collides with an existing one.
const MAX_DID_ATTEMPTS: usize = 3;

/// Default page size for company search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Result of a successful registration.
///
/// The code and token are handed to the delivery channel; the caller decides
/// what (if anything) to echo back to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedUser {
    pub user: User,
    pub did: String,
    pub verification_token: String,
    pub verification_code: String,
    pub verification_expires_at: DateTime<Utc>,
}

/// Orchestrates onboarding, verification and trust scoring for users.
///
/// Every mutating operation runs in a single store transaction: it either
/// commits all of its rows or leaves the store untouched.
pub struct IdentityLifecycleManager {
    store: IdentityStore,
    codec: DidCodec,
    config: IdentityConfig,
    clock: Arc<dyn Clock>,
}

impl IdentityLifecycleManager {
    pub fn new(store: IdentityStore, config: IdentityConfig) -> Result<Self, OnboardingError> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Fails with [`OnboardingError::ValidationError`] if `config` is unusable.
    pub fn with_clock(
        store: IdentityStore,
        config: IdentityConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, OnboardingError> {
        config.validate()?;
        Ok(Self {
            store,
            codec: DidCodec::from_config(&config),
            config,
            clock,
        })
    }

    pub fn store(&self) -> &IdentityStore {
        &self.store
    }

    pub fn codec(&self) -> &DidCodec {
        &self.codec
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a wallet and email, mint a DID and issue an email verification.
    ///
    /// The user row, DID metadata (score 0, unverified) and verification
    /// record are written in one transaction.
    pub async fn create_user(
        &self,
        wallet_address: &str,
        email: &str,
    ) -> Result<CreatedUser, OnboardingError> {
        if !validate_wallet_address(wallet_address) {
            return Err(OnboardingError::InvalidAddress(wallet_address.to_string()));
        }
        if !validate_email(email) {
            return Err(OnboardingError::ValidationError(format!(
                "invalid email address: {}",
                email
            )));
        }
        if self.store.find_user_by_wallet(wallet_address)?.is_some() {
            return Err(OnboardingError::DuplicateWallet(wallet_address.to_string()));
        }
        if self.store.find_user_by_email(email)?.is_some() {
            return Err(OnboardingError::DuplicateEmail(email.to_string()));
        }

        let state = OnboardingStateMachine::transition(
            OnboardingState::Unregistered,
            OnboardingEvent::Register,
        )?;

        let verification_token = generate_secure_token(self.config.token_bytes);
        let verification_code = generate_verification_code();
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.config.verification_ttl())
            .ok_or_else(|| OnboardingError::Internal("verification expiry out of range".into()))?;

        let mut tx = self.store.begin().await;
        let user = self.insert_user_with_fresh_did(&mut tx, wallet_address, email, now)?;

        let document = self
            .codec
            .generate_did_document(&user.did, wallet_address, now)
            .to_value()?;
        tx.insert_did_metadata(&DidMetadata::new(user.id, document, now))?;
        tx.insert_email_verification(&EmailVerification::new(
            user.id,
            email.to_string(),
            verification_code.clone(),
            verification_token.clone(),
            expires_at,
            now,
        ))?;
        tx.commit()?;

        tracing::info!(
            user_id = %user.id,
            did = %user.did,
            state = %state,
            "user registered"
        );

        Ok(CreatedUser {
            did: user.did.clone(),
            user,
            verification_token,
            verification_code,
            verification_expires_at: expires_at,
        })
    }

    /// Mint a DID and insert the user row, retrying with a fresh DID on the
    /// (astronomically unlikely) event of a DID collision.
    fn insert_user_with_fresh_did(
        &self,
        tx: &mut Transaction,
        wallet_address: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<User, OnboardingError> {
        for attempt in 1..=MAX_DID_ATTEMPTS {
            let did = self.codec.generate_did(wallet_address)?;
            let user = User::new(wallet_address.to_string(), did, email.to_string(), now);
            match tx.insert_user(&user) {
                Ok(()) => return Ok(user),
                Err(StoreError::UniqueViolation(UniqueField::Did)) => {
                    tracing::warn!(attempt, "minted DID already taken, retrying");
                }
                Err(StoreError::UniqueViolation(UniqueField::WalletAddress)) => {
                    return Err(OnboardingError::DuplicateWallet(wallet_address.to_string()));
                }
                Err(StoreError::UniqueViolation(UniqueField::Email)) => {
                    return Err(OnboardingError::DuplicateEmail(email.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(OnboardingError::Internal(format!(
            "could not mint a unique DID after {} attempts",
            MAX_DID_ATTEMPTS
        )))
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    /// Record the business profile and mark onboarding complete.
    pub async fn complete_user_profile(
        &self,
        user_id: UserId,
        mut profile_data: ProfileData,
    ) -> Result<(User, Profile), OnboardingError> {
        profile_data.company_name = sanitize_input(&profile_data.company_name);
        validate_profile_data(&profile_data)?;

        let mut tx = self.store.begin().await;
        let mut user = require_user(&tx, user_id)?;
        let state =
            OnboardingStateMachine::transition(user.onboarding_state(), OnboardingEvent::CompleteProfile)?;

        let now = self.clock.now();
        let profile = Profile::new(user_id, profile_data, now);
        tx.insert_profile(&profile)?;

        user.onboarding_completed = true;
        user.updated_at = now;
        tx.update_user(&user)?;
        tx.commit()?;

        tracing::info!(user_id = %user_id, state = %state, "onboarding completed");
        Ok((user, profile))
    }

    /// Apply a partial update to an existing profile.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        mut update: ProfileUpdate,
    ) -> Result<Profile, OnboardingError> {
        if let Some(name) = update.company_name.as_mut() {
            *name = sanitize_input(name);
        }
        validate_profile_update(&update)?;

        let mut tx = self.store.begin().await;
        let mut profile = tx
            .profile(user_id)?
            .ok_or_else(|| OnboardingError::ProfileNotFound(user_id.to_string()))?;
        profile.apply(update, self.clock.now());
        tx.update_profile(&profile)?;
        tx.commit()?;

        tracing::debug!(user_id = %user_id, "profile updated");
        Ok(profile)
    }

    // ------------------------------------------------------------------
    // Email verification
    // ------------------------------------------------------------------

    /// Confirm an email with the bearer token.
    ///
    /// Returns `false`, without writing anything, when the token is unknown,
    /// expired or already used.
    pub async fn verify_email(&self, token: &str) -> Result<bool, OnboardingError> {
        let now = self.clock.now();
        let tx = self.store.begin().await;
        let Some(record) = tx.active_verification_by_token(token, now)? else {
            tracing::debug!("no active verification for token");
            return Ok(false);
        };
        self.consume_verification(tx, record, now)?;
        Ok(true)
    }

    /// Confirm an email with the 6-digit code sent to it.
    ///
    /// Fails with [`OnboardingError::VerificationNotFound`] when no active
    /// verification for this user carries the code.
    pub async fn verify_email_with_code(
        &self,
        user_id: UserId,
        code: &str,
    ) -> Result<TrustAssessment, OnboardingError> {
        let now = self.clock.now();
        let tx = self.store.begin().await;
        let Some(record) = tx.active_verification_by_code(user_id, code, now)? else {
            tracing::debug!(user_id = %user_id, "no active verification for code");
            return Err(OnboardingError::VerificationNotFound);
        };
        self.consume_verification(tx, record, now)
    }

    /// Mark the record used, flag the user's email as verified and rescore.
    fn consume_verification(
        &self,
        mut tx: Transaction,
        mut record: EmailVerification,
        now: DateTime<Utc>,
    ) -> Result<TrustAssessment, OnboardingError> {
        let mut user = require_user(&tx, record.user_id)?;

        record.verified_at = Some(now);
        tx.consume_email_verification(&record)?;

        if !user.email_verified {
            OnboardingStateMachine::transition(user.onboarding_state(), OnboardingEvent::VerifyEmail)?;
            user.email_verified = true;
            user.updated_at = now;
            tx.update_user(&user)?;
        }

        let assessment = match tx.did_metadata(user.id)? {
            Some(mut metadata) => {
                let facts = VerificationFacts {
                    email_verified: true,
                    ..metadata.known_facts()
                };
                let assessment = TrustAssessment::from_facts(&facts);
                metadata.trust_score = assessment.score;
                metadata.verification_status = assessment.status;
                metadata.email_verified_at.get_or_insert(now);
                if metadata.verification_data.is_some() {
                    metadata.verification_data = Some(facts);
                }
                metadata.updated_at = now;
                tx.update_did_metadata(&metadata)?;
                assessment
            }
            None => {
                tracing::warn!(user_id = %user.id, "user has no DID metadata to rescore");
                TrustAssessment::from_facts(&VerificationFacts::email_only())
            }
        };

        tx.commit()?;

        tracing::info!(
            user_id = %user.id,
            did = %user.did,
            trust_score = assessment.score,
            status = %assessment.status,
            "email verified"
        );
        Ok(assessment)
    }

    // ------------------------------------------------------------------
    // Trust score
    // ------------------------------------------------------------------

    /// Recompute and persist the score from a complete set of facts.
    ///
    /// The facts replace whatever was known before; they are not merged.
    /// Milestone timestamps are stamped the first time a fact turns true.
    pub async fn update_trust_score(
        &self,
        user_id: UserId,
        facts: VerificationFacts,
    ) -> Result<DidMetadata, OnboardingError> {
        if let Some(rate) = facts.on_time_payment_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(OnboardingError::ValidationError(format!(
                    "on-time payment rate must be within [0, 1], got {}",
                    rate
                )));
            }
        }

        let assessment = TrustAssessment::from_facts(&facts);
        let now = self.clock.now();

        let mut tx = self.store.begin().await;
        require_user(&tx, user_id)?;
        let mut metadata = tx
            .did_metadata(user_id)?
            .ok_or_else(|| OnboardingError::DidMetadataNotFound(user_id.to_string()))?;

        let previous = metadata.trust_score;
        metadata.trust_score = assessment.score;
        metadata.verification_status = assessment.status;
        metadata.verification_data = Some(facts);
        if facts.email_verified {
            metadata.email_verified_at.get_or_insert(now);
        }
        if facts.domain_verified {
            metadata.domain_verified_at.get_or_insert(now);
        }
        if facts.business_verified {
            metadata.business_verified_at.get_or_insert(now);
        }
        metadata.updated_at = now;

        tx.update_did_metadata(&metadata)?;
        tx.commit()?;

        tracing::info!(
            user_id = %user_id,
            previous,
            trust_score = assessment.score,
            status = %assessment.status,
            "trust score updated"
        );
        Ok(metadata)
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn check_user_exists(&self, wallet_address: &str) -> Result<bool, OnboardingError> {
        Ok(self.store.find_user_by_wallet(wallet_address)?.is_some())
    }

    pub fn get_user_by_wallet(
        &self,
        wallet_address: &str,
    ) -> Result<Option<UserRecord>, OnboardingError> {
        self.store
            .find_user_by_wallet(wallet_address)?
            .map(|user| self.store.load_record(user))
            .transpose()
            .map_err(Into::into)
    }

    pub fn get_user_by_did(&self, did: &str) -> Result<Option<UserRecord>, OnboardingError> {
        self.store
            .find_user_by_did(did)?
            .map(|user| self.store.load_record(user))
            .transpose()
            .map_err(Into::into)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>, OnboardingError> {
        Ok(self.store.find_user_by_email(email)?)
    }

    pub fn get_did_metadata(&self, user_id: UserId) -> Result<Option<DidMetadata>, OnboardingError> {
        Ok(self.store.find_did_metadata(user_id)?)
    }

    /// Public view of a DID's business. `None` until the profile exists.
    pub fn get_public_profile(&self, did: &str) -> Result<Option<PublicProfile>, OnboardingError> {
        let Some(user) = self.store.find_user_by_did(did)? else {
            return Ok(None);
        };
        let Some(profile) = self.store.find_profile(user.id)? else {
            return Ok(None);
        };
        let metadata = self.store.find_did_metadata(user.id)?;
        Ok(Some(PublicProfile::from_parts(&user, &profile, metadata.as_ref())))
    }

    /// Case-insensitive substring search over company names, sorted by name
    /// ignoring case.
    pub fn search_users_by_company(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<PublicProfile>, OnboardingError> {
        let needle = term.trim().to_lowercase();
        let mut matches: Vec<Profile> = self
            .store
            .all_profiles()?
            .into_iter()
            .filter(|p| p.data.company_name.to_lowercase().contains(&needle))
            .collect();
        matches.sort_by_cached_key(|p| p.data.company_name.to_lowercase());

        let mut results = Vec::new();
        for profile in matches.into_iter().take(limit) {
            let Some(user) = self.store.find_user_by_id(profile.user_id)? else {
                continue;
            };
            let metadata = self.store.find_did_metadata(user.id)?;
            results.push(PublicProfile::from_parts(&user, &profile, metadata.as_ref()));
        }
        Ok(results)
    }

    /// Flush and release the store.
    pub async fn close(&self) -> Result<(), OnboardingError> {
        self.store.close().await?;
        Ok(())
    }
}

fn require_user(tx: &Transaction, user_id: UserId) -> Result<User, OnboardingError> {
    tx.user(user_id)?
        .ok_or_else(|| OnboardingError::UserNotFound(user_id.to_string()))
}
