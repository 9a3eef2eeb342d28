//! Email verification codes and bearer tokens.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

/// Default entropy behind a verification token.
pub const DEFAULT_TOKEN_BYTES: usize = 32;

const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// A 6-digit numeric code, uniform over 100000–999999.
pub fn generate_verification_code() -> String {
    generate_verification_code_with(&mut OsRng)
}

pub fn generate_verification_code_with<R: Rng + CryptoRng>(rng: &mut R) -> String {
    rng.gen_range(CODE_MIN..=CODE_MAX).to_string()
}

/// `length` random bytes, base64url-encoded without padding.
pub fn generate_secure_token(length: usize) -> String {
    generate_secure_token_with(&mut OsRng, length)
}

pub fn generate_secure_token_with<R: RngCore + CryptoRng>(rng: &mut R, length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
