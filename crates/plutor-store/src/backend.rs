use crate::error::StoreError;

/// Column families (tables and indexes).
pub const CF_USERS: &str = "users";
pub const CF_PROFILES: &str = "profiles";
pub const CF_DID_METADATA: &str = "did_metadata";
pub const CF_EMAIL_VERIFICATIONS: &str = "email_verifications";
/// wallet address -> user id
pub const CF_WALLET_INDEX: &str = "wallet_index";
/// email -> user id
pub const CF_EMAIL_INDEX: &str = "email_index";
/// DID -> user id
pub const CF_DID_INDEX: &str = "did_index";
/// verification token -> verification id
pub const CF_TOKEN_INDEX: &str = "token_index";
/// user id -> JSON list of verification ids
pub const CF_USER_VERIFICATIONS: &str = "user_verifications";

pub const ALL_COLUMN_FAMILIES: [&str; 9] = [
    CF_USERS,
    CF_PROFILES,
    CF_DID_METADATA,
    CF_EMAIL_VERIFICATIONS,
    CF_WALLET_INDEX,
    CF_EMAIL_INDEX,
    CF_DID_INDEX,
    CF_TOKEN_INDEX,
    CF_USER_VERIFICATIONS,
];

/// One write in an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put {
        cf: &'static str,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: &'static str,
        key: Vec<u8>,
    },
}

/// Raw key-value storage with column families and atomic batches.
///
/// `write_batch` must apply every op or none, and readers must never observe
/// a partially applied batch.
pub trait KvBackend: Send + Sync {
    fn get(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Every entry in a column family, in key order.
    fn scan(&self, cf: &str) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StoreError>;

    /// Persist buffered writes, if the backend buffers any.
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
