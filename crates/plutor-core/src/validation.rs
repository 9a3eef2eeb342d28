//! Input validation for onboarding requests.

use crate::error::CoreError;
use crate::types::{ProfileData, ProfileUpdate};

/// Characters allowed in base58 text (no `0`, `O`, `I`, `l`).
pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const MAX_EMAIL_LEN: usize = 255;
const MAX_COMPANY_NAME_LEN: usize = 255;

pub fn is_base58_char(c: char) -> bool {
    BASE58_ALPHABET.contains(c)
}

/// Textual shape of a wallet address: 32–44 base58 characters.
///
/// This does not decode the key; see the DID codec for that.
pub fn validate_wallet_address(address: &str) -> bool {
    (32..=44).contains(&address.len()) && address.chars().all(is_base58_char)
}

/// Minimal RFC 5322-ish check: `local@domain.tld`, no whitespace.
pub fn validate_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Trim and strip angle brackets.
pub fn sanitize_input(input: &str) -> String {
    input.trim().replace(['<', '>'], "")
}

fn validate_company_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::MissingField("company_name".into()));
    }
    if name.len() > MAX_COMPANY_NAME_LEN {
        return Err(CoreError::ValidationError(format!(
            "company name exceeds {} characters",
            MAX_COMPANY_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_country(country: Option<&str>) -> Result<(), CoreError> {
    match country {
        Some(code) if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) => Err(
            CoreError::ValidationError(format!("country must be an ISO 3166-1 alpha-2 code, got: {}", code)),
        ),
        _ => Ok(()),
    }
}

/// Check a profile submitted at onboarding completion.
pub fn validate_profile_data(data: &ProfileData) -> Result<(), CoreError> {
    validate_company_name(&data.company_name)?;
    validate_country(data.country.as_deref())
}

/// Check a partial profile update.
pub fn validate_profile_update(update: &ProfileUpdate) -> Result<(), CoreError> {
    if let Some(name) = &update.company_name {
        validate_company_name(name)?;
    }
    validate_country(update.country.as_deref())
}
