use chrono::{DateTime, Utc};
use plutor_core::validation::{is_base58_char, BASE58_ALPHABET};
use plutor_core::IdentityConfig;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::document::DidDocument;
use crate::error::IdentityError;

/// Decoded length of a Solana public key.
const PUBLIC_KEY_LEN: usize = 32;

/// Random bytes mixed into every DID hash.
const SALT_LEN: usize = 16;

/// Number of digest bytes mapped into the identifier.
const IDENTIFIER_LEN: usize = 32;

const MIN_IDENTIFIER_LEN: usize = 32;
const MAX_IDENTIFIER_LEN: usize = 44;

/// Mints and validates wallet-bound DIDs.
///
/// The DID format is: `did:<method>:<identifier>`, where the identifier is a
/// salted SHA-256 of the wallet address folded into the base58 alphabet.
/// Salting means the same wallet never yields the same DID twice, so a DID
/// cannot be recomputed from a public wallet address.
#[derive(Debug, Clone)]
pub struct DidCodec {
    method: String,
    profile_base_url: String,
}

impl DidCodec {
    pub fn new(method: impl Into<String>, profile_base_url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            profile_base_url: profile_base_url.into(),
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.did_method.clone(), config.profile_base_url.clone())
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Mint a fresh DID for a wallet.
    ///
    /// Fails with [`IdentityError::InvalidAddress`] unless the address is
    /// base58 text decoding to a 32-byte public key.
    pub fn generate_did(&self, wallet_address: &str) -> Result<String, IdentityError> {
        validate_public_key(wallet_address)?;

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let mut hasher = Sha256::new();
        hasher.update(wallet_address.as_bytes());
        hasher.update(hex::encode(salt).as_bytes());
        let digest = hasher.finalize();

        let did = format!("did:{}:{}", self.method, encode_identifier(&digest));
        tracing::debug!(did = %did, "DID minted");
        Ok(did)
    }

    /// Whether `did` is `did:<method>:` followed by 32–44 base58 characters.
    pub fn is_valid_did(&self, did: &str) -> bool {
        let Some(rest) = did.strip_prefix("did:") else {
            return false;
        };
        let Some(identifier) = rest
            .strip_prefix(self.method.as_str())
            .and_then(|r| r.strip_prefix(':'))
        else {
            return false;
        };
        (MIN_IDENTIFIER_LEN..=MAX_IDENTIFIER_LEN).contains(&identifier.len())
            && identifier.chars().all(is_base58_char)
    }

    /// Build the DID Document for a freshly minted DID, issued at `now`.
    pub fn generate_did_document(
        &self,
        did: &str,
        wallet_address: &str,
        now: DateTime<Utc>,
    ) -> DidDocument {
        DidDocument::new(did, wallet_address, &self.profile_base_url, now)
    }
}

impl Default for DidCodec {
    fn default() -> Self {
        Self::from_config(&IdentityConfig::default())
    }
}

/// Fold digest bytes into the alphabet by `byte mod 58`.
fn encode_identifier(digest: &[u8]) -> String {
    let alphabet = BASE58_ALPHABET.as_bytes();
    digest
        .iter()
        .take(IDENTIFIER_LEN)
        .map(|byte| alphabet[*byte as usize % alphabet.len()] as char)
        .collect()
}

fn validate_public_key(wallet_address: &str) -> Result<(), IdentityError> {
    let bytes = bs58::decode(wallet_address)
        .into_vec()
        .map_err(|e| IdentityError::InvalidAddress(format!("{}: {}", wallet_address, e)))?;
    if bytes.len() != PUBLIC_KEY_LEN {
        return Err(IdentityError::InvalidAddress(format!(
            "{}: decodes to {} bytes, expected {}",
            wallet_address,
            bytes.len(),
            PUBLIC_KEY_LEN
        )));
    }
    Ok(())
}

/// The method segment of `did:<method>:...`, if the string has that shape.
pub fn extract_method(did: &str) -> Option<&str> {
    let rest = did.strip_prefix("did:")?;
    let (method, _) = rest.split_once(':')?;
    if method.is_empty() {
        return None;
    }
    Some(method)
}

/// Everything after `did:<method>:`, if non-empty.
pub fn extract_identifier(did: &str) -> Option<&str> {
    let rest = did.strip_prefix("did:")?;
    let (method, identifier) = rest.split_once(':')?;
    if method.is_empty() || identifier.is_empty() {
        return None;
    }
    Some(identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLETS: [&str; 4] = [
        "7EcDhSYGxXyscszYEp35KHN8vvw3svAuLKTzXwCFLtV",
        "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
        "11111111111111111111111111111111",
        "So11111111111111111111111111111111111111112",
    ];

    #[test]
    fn test_generated_did_is_valid() {
        let codec = DidCodec::default();
        for wallet in WALLETS {
            let did = codec.generate_did(wallet).unwrap();
            assert!(did.starts_with("did:solana:"), "{}", did);
            assert!(codec.is_valid_did(&did), "{}", did);
            assert_eq!(extract_identifier(&did).map(str::len), Some(32));
        }
    }

    #[test]
    fn test_same_wallet_yields_distinct_dids() {
        let codec = DidCodec::default();
        let first = codec.generate_did(WALLETS[0]).unwrap();
        let second = codec.generate_did(WALLETS[0]).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_addresses_rejected() {
        let codec = DidCodec::default();
        for bad in ["", "Addr1", "0OIl", "not a wallet", "7EcDhSYGxXyscszYEp35KHN8vvw3svAuLKTzXwCFLtV7EcD"] {
            assert!(
                matches!(codec.generate_did(bad), Err(IdentityError::InvalidAddress(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_is_valid_did() {
        let codec = DidCodec::default();
        let ident32 = "1".repeat(32);
        let ident44 = "z".repeat(44);
        assert!(codec.is_valid_did(&format!("did:solana:{}", ident32)));
        assert!(codec.is_valid_did(&format!("did:solana:{}", ident44)));
        assert!(!codec.is_valid_did(&format!("did:solana:{}", "1".repeat(31))));
        assert!(!codec.is_valid_did(&format!("did:solana:{}", "1".repeat(45))));
        assert!(!codec.is_valid_did(&format!("did:solana:{}0", "1".repeat(32))));
        assert!(!codec.is_valid_did(&format!("did:web:{}", ident32)));
        assert!(!codec.is_valid_did(&format!("did:solanax:{}", ident32)));
        assert!(!codec.is_valid_did(&ident32));
    }

    #[test]
    fn test_custom_method() {
        let codec = DidCodec::new("plutor", "https://app.example.com");
        let did = codec.generate_did(WALLETS[1]).unwrap();
        assert!(did.starts_with("did:plutor:"));
        assert!(codec.is_valid_did(&did));
        assert!(!DidCodec::default().is_valid_did(&did));
    }

    #[test]
    fn test_extract_parts() {
        assert_eq!(extract_method("did:solana:abc"), Some("solana"));
        assert_eq!(extract_identifier("did:solana:abc"), Some("abc"));
        assert_eq!(extract_identifier("did:web:a:b"), Some("a:b"));
        assert_eq!(extract_method("did::abc"), None);
        assert_eq!(extract_method("solana:abc"), None);
        assert_eq!(extract_identifier("did:solana:"), None);
        assert_eq!(extract_identifier("did:solana"), None);
    }

    #[test]
    fn test_encode_identifier_mapping() {
        // 0 -> '1', 57 -> 'z', 58 wraps back to '1'.
        let encoded = encode_identifier(&[0, 57, 58, 255]);
        assert_eq!(encoded, format!("1z1{}", &BASE58_ALPHABET[255 % 58..255 % 58 + 1]));
    }

    #[test]
    fn test_document_binds_wallet() {
        let codec = DidCodec::default();
        let did = codec.generate_did(WALLETS[0]).unwrap();
        let doc = codec.generate_did_document(&did, WALLETS[0], Utc::now());
        assert_eq!(doc.id, did);
        assert_eq!(doc.primary_public_key(), Some(WALLETS[0]));
    }
}
