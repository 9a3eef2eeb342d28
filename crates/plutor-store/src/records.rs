//! Typed point lookups shared by committed reads and open transactions.

use chrono::{DateTime, Utc};
use plutor_core::{DidMetadata, EmailVerification, Profile, User, UserId};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::backend::{
    CF_DID_INDEX, CF_DID_METADATA, CF_EMAIL_INDEX, CF_EMAIL_VERIFICATIONS, CF_PROFILES,
    CF_TOKEN_INDEX, CF_USERS, CF_USER_VERIFICATIONS, CF_WALLET_INDEX,
};
use crate::error::StoreError;

pub(crate) fn decode<T: DeserializeOwned>(cf: &'static str, bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
        cf,
        reason: e.to_string(),
    })
}

pub(crate) fn decode_id(cf: &'static str, bytes: &[u8]) -> Result<Uuid, StoreError> {
    Uuid::from_slice(bytes).map_err(|e| StoreError::Corrupt {
        cf,
        reason: e.to_string(),
    })
}

/// Read access to the identity tables.
///
/// Implementors only provide `raw_get`; every typed lookup is built on it, so
/// a transaction sees its own staged writes through the same methods.
pub trait Records {
    fn raw_get(&self, cf: &'static str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn get_json<T: DeserializeOwned>(
        &self,
        cf: &'static str,
        key: &[u8],
    ) -> Result<Option<T>, StoreError> {
        self.raw_get(cf, key)?
            .map(|bytes| decode(cf, &bytes))
            .transpose()
    }

    fn index_lookup(&self, cf: &'static str, key: &str) -> Result<Option<Uuid>, StoreError> {
        self.raw_get(cf, key.as_bytes())?
            .map(|bytes| decode_id(cf, &bytes))
            .transpose()
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.get_json(CF_USERS, id.as_bytes())
    }

    fn user_by_wallet(&self, wallet_address: &str) -> Result<Option<User>, StoreError> {
        match self.index_lookup(CF_WALLET_INDEX, wallet_address)? {
            Some(id) => self.user(id),
            None => Ok(None),
        }
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        match self.index_lookup(CF_EMAIL_INDEX, email)? {
            Some(id) => self.user(id),
            None => Ok(None),
        }
    }

    fn user_by_did(&self, did: &str) -> Result<Option<User>, StoreError> {
        match self.index_lookup(CF_DID_INDEX, did)? {
            Some(id) => self.user(id),
            None => Ok(None),
        }
    }

    fn profile(&self, user_id: UserId) -> Result<Option<Profile>, StoreError> {
        self.get_json(CF_PROFILES, user_id.as_bytes())
    }

    fn did_metadata(&self, user_id: UserId) -> Result<Option<DidMetadata>, StoreError> {
        self.get_json(CF_DID_METADATA, user_id.as_bytes())
    }

    fn email_verification(&self, id: Uuid) -> Result<Option<EmailVerification>, StoreError> {
        self.get_json(CF_EMAIL_VERIFICATIONS, id.as_bytes())
    }

    /// Ids of every verification ever issued to a user, oldest first.
    fn verification_ids(&self, user_id: UserId) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .get_json::<Vec<Uuid>>(CF_USER_VERIFICATIONS, user_id.as_bytes())?
            .unwrap_or_default())
    }

    fn email_verifications(&self, user_id: UserId) -> Result<Vec<EmailVerification>, StoreError> {
        let mut records = Vec::new();
        for id in self.verification_ids(user_id)? {
            if let Some(record) = self.email_verification(id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// The unexpired, unconsumed verification carrying `token`.
    fn active_verification_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EmailVerification>, StoreError> {
        let Some(id) = self.index_lookup(CF_TOKEN_INDEX, token)? else {
            return Ok(None);
        };
        Ok(self
            .email_verification(id)?
            .filter(|record| record.is_active(now)))
    }

    /// The newest unexpired, unconsumed verification for `user_id` with `code`.
    fn active_verification_by_code(
        &self,
        user_id: UserId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EmailVerification>, StoreError> {
        Ok(self
            .email_verifications(user_id)?
            .into_iter()
            .filter(|record| record.code == code && record.is_active(now))
            .max_by_key(|record| record.created_at))
    }
}
