//! Plutor Node
//!
//! HTTP service over the identity lifecycle: configuration, the axum API,
//! verification delivery and process wiring.

pub mod api;
pub mod config;
pub mod mailer;
pub mod node;

pub use api::{build_router, AppState};
pub use config::{PlutorConfig, StorageBackend};
pub use mailer::{LogMailer, MailerError, MemoryMailer, VerificationMailer, VerificationMessage};
pub use node::PlutorNode;
