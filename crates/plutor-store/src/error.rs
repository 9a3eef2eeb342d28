use std::fmt;

/// Which uniqueness constraint a write violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    UserId,
    WalletAddress,
    Email,
    Did,
    VerificationToken,
    /// A user may have at most one profile.
    Profile,
    /// A user may have at most one DID metadata row.
    DidMetadata,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UserId => "user id",
            Self::WalletAddress => "wallet address",
            Self::Email => "email",
            Self::Did => "DID",
            Self::VerificationToken => "verification token",
            Self::Profile => "profile",
            Self::DidMetadata => "DID metadata",
        };
        f.write_str(name)
    }
}

/// Store-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(UniqueField),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("write rejected: {0}")]
    Conflict(String),

    #[error("corrupt record in {cf}: {reason}")]
    Corrupt { cf: &'static str, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("rocksdb error: {0}")]
    Rocks(#[from] rocksdb::Error),

    #[error("backend error: {0}")]
    Backend(String),
}
