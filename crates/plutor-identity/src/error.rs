/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
