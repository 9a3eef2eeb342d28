use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

pub const DID_CONTEXT_V1: &str = "https://www.w3.org/ns/did/v1";
pub const ED25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";

/// A verification method within a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Verification method identifier (e.g., "did:solana:abc#key-1").
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: String,
    /// The wallet address, used directly as key material.
    pub public_key_multibase: String,
}

/// A service endpoint in a DID Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
}

/// W3C-shaped DID Document binding a DID to its wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    pub controller: String,
    pub verification_method: Vec<VerificationMethod>,
    pub authentication: Vec<String>,
    pub assertion_method: Vec<String>,
    pub service: Vec<Service>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl DidDocument {
    /// Create a document with one key (the wallet) and one profile service,
    /// stamped with `now`.
    pub fn new(did: &str, wallet_address: &str, profile_base_url: &str, now: DateTime<Utc>) -> Self {
        let key_id = format!("{}#key-1", did);
        let vm = VerificationMethod {
            id: key_id.clone(),
            method_type: "Ed25519VerificationKey2020".to_string(),
            controller: did.to_string(),
            public_key_multibase: wallet_address.to_string(),
        };
        let profile = Service {
            id: format!("{}#plutor-profile", did),
            service_type: "PlutorProfile".to_string(),
            service_endpoint: format!(
                "{}/profile/{}",
                profile_base_url.trim_end_matches('/'),
                did
            ),
        };
        Self {
            context: vec![DID_CONTEXT_V1.to_string(), ED25519_2020_CONTEXT.to_string()],
            id: did.to_string(),
            controller: did.to_string(),
            verification_method: vec![vm],
            authentication: vec![key_id.clone()],
            assertion_method: vec![key_id],
            service: vec![profile],
            created: now,
            updated: now,
        }
    }

    /// Get the primary public key (first verification method).
    pub fn primary_public_key(&self) -> Option<&str> {
        self.verification_method
            .first()
            .map(|vm| vm.public_key_multibase.as_str())
    }

    /// JSON form, as persisted alongside the DID metadata.
    pub fn to_value(&self) -> Result<serde_json::Value, IdentityError> {
        Ok(serde_json::to_value(self)?)
    }
}
