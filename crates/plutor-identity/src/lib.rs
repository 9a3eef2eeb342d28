//! Plutor Identity Layer
//!
//! Identity primitives for wallet-bound business accounts:
//! - DID minting, parsing and validation
//! - DID Documents (W3C-shaped)
//! - Trust score computation and verification tiers
//! - Email verification codes and bearer tokens

pub mod did;
pub mod document;
pub mod error;
pub mod tokens;
pub mod trust_score;

pub use did::{extract_identifier, extract_method, DidCodec};
pub use document::DidDocument;
pub use error::IdentityError;
pub use tokens::{generate_secure_token, generate_verification_code, DEFAULT_TOKEN_BYTES};
pub use trust_score::{calculate_trust_score, verification_status, TrustAssessment};
