use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use plutor_core::{DidMetadata, EmailVerification, Profile, User, UserId, UserRecord};
use tokio::sync::Mutex;

use crate::backend::{KvBackend, CF_PROFILES};
use crate::error::StoreError;
use crate::memory::MemoryBackend;
use crate::records::{decode, Records};
use crate::rocks::RocksBackend;
use crate::transaction::Transaction;

/// Handle to the identity tables.
///
/// Reads outside a transaction see committed state only. Writes go through
/// [`IdentityStore::begin`], which serializes writers so that uniqueness
/// checks and "still active" predicates cannot race.
#[derive(Clone)]
pub struct IdentityStore {
    backend: Arc<dyn KvBackend>,
    writer: Arc<Mutex<()>>,
}

impl IdentityStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// A fresh, empty in-memory store.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Open (or create) a RocksDB-backed store at `path`.
    pub fn open_rocksdb(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(RocksBackend::open(path)?)))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Start a write transaction, waiting for any in-flight writer to finish.
    pub async fn begin(&self) -> Transaction {
        let guard = self.writer.clone().lock_owned().await;
        Transaction::new(self.backend.clone(), guard)
    }

    /// Flush the backend. Waits for the current writer so nothing is torn.
    pub async fn close(&self) -> Result<(), StoreError> {
        let _guard = self.writer.lock().await;
        self.backend.flush()?;
        tracing::info!(backend = self.backend.name(), "identity store closed");
        Ok(())
    }

    pub fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.user(id)
    }

    pub fn find_user_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, StoreError> {
        self.user_by_wallet(wallet_address)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.user_by_email(email)
    }

    pub fn find_user_by_did(&self, did: &str) -> Result<Option<User>, StoreError> {
        self.user_by_did(did)
    }

    pub fn find_profile(&self, user_id: UserId) -> Result<Option<Profile>, StoreError> {
        self.profile(user_id)
    }

    pub fn find_did_metadata(&self, user_id: UserId) -> Result<Option<DidMetadata>, StoreError> {
        self.did_metadata(user_id)
    }

    pub fn find_email_verifications(
        &self,
        user_id: UserId,
    ) -> Result<Vec<EmailVerification>, StoreError> {
        self.email_verifications(user_id)
    }

    pub fn find_active_verification_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EmailVerification>, StoreError> {
        self.active_verification_by_token(token, now)
    }

    /// A user joined with its profile and DID metadata.
    pub fn load_record(&self, user: User) -> Result<UserRecord, StoreError> {
        let profile = self.profile(user.id)?;
        let did_metadata = self.did_metadata(user.id)?;
        Ok(UserRecord {
            user,
            profile,
            did_metadata,
        })
    }

    /// Every stored profile.
    pub fn all_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        self.backend
            .scan(CF_PROFILES)?
            .into_iter()
            .map(|(_, bytes)| decode(CF_PROFILES, &bytes))
            .collect()
    }
}

impl Records for IdentityStore {
    fn raw_get(&self, cf: &'static str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.backend.get(cf, key)
    }
}
