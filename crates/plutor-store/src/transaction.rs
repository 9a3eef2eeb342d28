use std::collections::BTreeMap;
use std::sync::Arc;

use plutor_core::{DidMetadata, EmailVerification, Profile, User, UserId};
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::backend::{
    BatchOp, KvBackend, CF_DID_INDEX, CF_DID_METADATA, CF_EMAIL_INDEX, CF_EMAIL_VERIFICATIONS,
    CF_PROFILES, CF_TOKEN_INDEX, CF_USERS, CF_USER_VERIFICATIONS, CF_WALLET_INDEX,
};
use crate::error::{StoreError, UniqueField};
use crate::records::Records;

/// A serialized write transaction.
///
/// Holds the store's writer lock for its whole lifetime. Writes are staged in
/// memory and reach the backend as one atomic batch on [`commit`]; dropping
/// the transaction without committing discards them.
///
/// [`commit`]: Transaction::commit
pub struct Transaction {
    backend: Arc<dyn KvBackend>,
    /// `None` marks a staged delete.
    staged: BTreeMap<(&'static str, Vec<u8>), Option<Vec<u8>>>,
    _writer: OwnedMutexGuard<()>,
}

impl Transaction {
    pub(crate) fn new(backend: Arc<dyn KvBackend>, writer: OwnedMutexGuard<()>) -> Self {
        Self {
            backend,
            staged: BTreeMap::new(),
            _writer: writer,
        }
    }

    fn put_raw(&mut self, cf: &'static str, key: &[u8], value: Vec<u8>) {
        self.staged.insert((cf, key.to_vec()), Some(value));
    }

    fn put_json<T: Serialize>(
        &mut self,
        cf: &'static str,
        key: &[u8],
        value: &T,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.put_raw(cf, key, bytes);
        Ok(())
    }

    fn delete_raw(&mut self, cf: &'static str, key: &[u8]) {
        self.staged.insert((cf, key.to_vec()), None);
    }

    fn require_user(&self, user_id: UserId) -> Result<User, StoreError> {
        self.user(user_id)?.ok_or_else(|| StoreError::NotFound {
            entity: "user",
            id: user_id.to_string(),
        })
    }

    /// Insert a user and its wallet, email and DID index entries.
    pub fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        if self.user(user.id)?.is_some() {
            return Err(StoreError::UniqueViolation(UniqueField::UserId));
        }
        if self.index_lookup(CF_WALLET_INDEX, &user.wallet_address)?.is_some() {
            return Err(StoreError::UniqueViolation(UniqueField::WalletAddress));
        }
        if self.index_lookup(CF_EMAIL_INDEX, &user.email)?.is_some() {
            return Err(StoreError::UniqueViolation(UniqueField::Email));
        }
        if self.index_lookup(CF_DID_INDEX, &user.did)?.is_some() {
            return Err(StoreError::UniqueViolation(UniqueField::Did));
        }

        let id = user.id.as_bytes().to_vec();
        self.put_json(CF_USERS, user.id.as_bytes(), user)?;
        self.put_raw(CF_WALLET_INDEX, user.wallet_address.as_bytes(), id.clone());
        self.put_raw(CF_EMAIL_INDEX, user.email.as_bytes(), id.clone());
        self.put_raw(CF_DID_INDEX, user.did.as_bytes(), id);
        Ok(())
    }

    /// Update a user's flags. Wallet, email and DID cannot change.
    pub fn update_user(&mut self, user: &User) -> Result<(), StoreError> {
        let current = self.require_user(user.id)?;
        if current.wallet_address != user.wallet_address
            || current.email != user.email
            || current.did != user.did
        {
            return Err(StoreError::Conflict(format!(
                "identity fields of user {} are immutable",
                user.id
            )));
        }
        self.put_json(CF_USERS, user.id.as_bytes(), user)
    }

    pub fn insert_profile(&mut self, profile: &Profile) -> Result<(), StoreError> {
        self.require_user(profile.user_id)?;
        if self.profile(profile.user_id)?.is_some() {
            return Err(StoreError::UniqueViolation(UniqueField::Profile));
        }
        self.put_json(CF_PROFILES, profile.user_id.as_bytes(), profile)
    }

    pub fn update_profile(&mut self, profile: &Profile) -> Result<(), StoreError> {
        if self.profile(profile.user_id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "profile",
                id: profile.user_id.to_string(),
            });
        }
        self.put_json(CF_PROFILES, profile.user_id.as_bytes(), profile)
    }

    pub fn insert_did_metadata(&mut self, metadata: &DidMetadata) -> Result<(), StoreError> {
        self.require_user(metadata.user_id)?;
        if self.did_metadata(metadata.user_id)?.is_some() {
            return Err(StoreError::UniqueViolation(UniqueField::DidMetadata));
        }
        self.put_json(CF_DID_METADATA, metadata.user_id.as_bytes(), metadata)
    }

    /// Update score, tier and milestone fields. The DID Document is write-once.
    pub fn update_did_metadata(&mut self, metadata: &DidMetadata) -> Result<(), StoreError> {
        let current = self
            .did_metadata(metadata.user_id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "DID metadata",
                id: metadata.user_id.to_string(),
            })?;
        if current.did_document != metadata.did_document {
            return Err(StoreError::Conflict(format!(
                "DID document of user {} is immutable",
                metadata.user_id
            )));
        }
        self.put_json(CF_DID_METADATA, metadata.user_id.as_bytes(), metadata)
    }

    pub fn insert_email_verification(
        &mut self,
        verification: &EmailVerification,
    ) -> Result<(), StoreError> {
        self.require_user(verification.user_id)?;
        if self
            .index_lookup(CF_TOKEN_INDEX, &verification.token)?
            .is_some()
        {
            return Err(StoreError::UniqueViolation(UniqueField::VerificationToken));
        }

        let mut ids = self.verification_ids(verification.user_id)?;
        ids.push(verification.id);

        self.put_json(
            CF_EMAIL_VERIFICATIONS,
            verification.id.as_bytes(),
            verification,
        )?;
        self.put_raw(
            CF_TOKEN_INDEX,
            verification.token.as_bytes(),
            verification.id.as_bytes().to_vec(),
        );
        self.put_json(CF_USER_VERIFICATIONS, verification.user_id.as_bytes(), &ids)
    }

    /// Persist a consumed verification. A record can only be consumed once.
    pub fn consume_email_verification(
        &mut self,
        verification: &EmailVerification,
    ) -> Result<(), StoreError> {
        let current = self
            .email_verification(verification.id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "email verification",
                id: verification.id.to_string(),
            })?;
        if current.is_consumed() {
            return Err(StoreError::Conflict(format!(
                "email verification {} already consumed",
                verification.id
            )));
        }
        if verification.verified_at.is_none() {
            return Err(StoreError::Conflict(format!(
                "email verification {} has no verified_at",
                verification.id
            )));
        }
        self.put_json(
            CF_EMAIL_VERIFICATIONS,
            verification.id.as_bytes(),
            verification,
        )
    }

    /// Delete a user together with everything it owns.
    pub fn delete_user(&mut self, user_id: UserId) -> Result<(), StoreError> {
        let user = self.require_user(user_id)?;

        for record in self.email_verifications(user_id)? {
            self.delete_raw(CF_TOKEN_INDEX, record.token.as_bytes());
            self.delete_raw(CF_EMAIL_VERIFICATIONS, record.id.as_bytes());
        }
        self.delete_raw(CF_USER_VERIFICATIONS, user_id.as_bytes());
        self.delete_raw(CF_PROFILES, user_id.as_bytes());
        self.delete_raw(CF_DID_METADATA, user_id.as_bytes());
        self.delete_raw(CF_WALLET_INDEX, user.wallet_address.as_bytes());
        self.delete_raw(CF_EMAIL_INDEX, user.email.as_bytes());
        self.delete_raw(CF_DID_INDEX, user.did.as_bytes());
        self.delete_raw(CF_USERS, user_id.as_bytes());
        Ok(())
    }

    /// Number of staged writes.
    pub fn pending_writes(&self) -> usize {
        self.staged.len()
    }

    /// Apply every staged write as one atomic batch.
    pub fn commit(self) -> Result<(), StoreError> {
        let writes = self.staged.len();
        let ops = self
            .staged
            .into_iter()
            .map(|((cf, key), value)| match value {
                Some(value) => BatchOp::Put { cf, key, value },
                None => BatchOp::Delete { cf, key },
            })
            .collect();
        self.backend.write_batch(ops)?;
        tracing::debug!(writes, backend = self.backend.name(), "transaction committed");
        Ok(())
    }
}

impl Records for Transaction {
    fn raw_get(&self, cf: &'static str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(staged) = self.staged.get(&(cf, key.to_vec())) {
            return Ok(staged.clone());
        }
        self.backend.get(cf, key)
    }
}
