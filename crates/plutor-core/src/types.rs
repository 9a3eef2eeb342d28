use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::onboarding_state::OnboardingState;

/// Primary key of a user row.
pub type UserId = Uuid;

/// A registered business identity, bound to one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Base58 wallet public key. Unique.
    pub wallet_address: String,
    /// `did:<method>:<identifier>`. Unique and never reassigned.
    pub did: String,
    /// Unique.
    pub email: String,
    pub email_verified: bool,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A fresh, unverified user with onboarding still pending.
    pub fn new(wallet_address: String, did: String, email: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            wallet_address,
            did,
            email,
            email_verified: false,
            onboarding_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn onboarding_state(&self) -> OnboardingState {
        OnboardingState::from_flags(self.email_verified, self.onboarding_completed)
    }
}

/// Business attributes supplied when onboarding completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    pub company_name: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// LLC, Inc, Ltd, Sole Proprietor, ...
    #[serde(default)]
    pub company_type: Option<String>,
    /// Business tax ID / VAT number.
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    /// ISO 3166-1 alpha-2.
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Partial profile update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub company_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_type: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub bio: Option<String>,
    pub logo_url: Option<String>,
}

/// Stored business profile, 1:1 with [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: UserId,
    #[serde(flatten)]
    pub data: ProfileData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(user_id: UserId, data: ProfileData, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: ProfileUpdate, now: DateTime<Utc>) {
        let ProfileUpdate {
            company_name,
            first_name,
            last_name,
            company_type,
            tax_id,
            address,
            city,
            state,
            postal_code,
            country,
            phone,
            website,
            industry,
            bio,
            logo_url,
        } = update;

        let data = &mut self.data;
        if let Some(v) = company_name {
            data.company_name = v;
        }
        replace_if_some(&mut data.first_name, first_name);
        replace_if_some(&mut data.last_name, last_name);
        replace_if_some(&mut data.company_type, company_type);
        replace_if_some(&mut data.tax_id, tax_id);
        replace_if_some(&mut data.address, address);
        replace_if_some(&mut data.city, city);
        replace_if_some(&mut data.state, state);
        replace_if_some(&mut data.postal_code, postal_code);
        replace_if_some(&mut data.country, country);
        replace_if_some(&mut data.phone, phone);
        replace_if_some(&mut data.website, website);
        replace_if_some(&mut data.industry, industry);
        replace_if_some(&mut data.bio, bio);
        replace_if_some(&mut data.logo_url, logo_url);
        self.updated_at = now;
    }
}

fn replace_if_some(field: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *field = value;
    }
}

/// Verification tier, a step function of the trust score.
///
/// Variants are ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Unverified,
    Basic,
    Verified,
    FullyVerified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Basic => "basic",
            Self::Verified => "verified",
            Self::FullyVerified => "fully_verified",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the trust score is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationFacts {
    pub email_verified: bool,
    pub domain_verified: bool,
    pub business_verified: bool,
    pub invoice_count: u32,
    /// Fraction of invoices paid on time, in `[0.0, 1.0]`.
    pub on_time_payment_rate: Option<f64>,
}

impl VerificationFacts {
    /// Facts for a user whose only achievement is a confirmed email.
    pub fn email_only() -> Self {
        Self {
            email_verified: true,
            ..Self::default()
        }
    }
}

/// Identity metadata attached to a user's DID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidMetadata {
    pub id: Uuid,
    pub user_id: UserId,
    /// DID Document as issued. Written once, opaque apart from `id`.
    pub did_document: serde_json::Value,
    /// Persisted as a decimal string.
    #[serde(with = "score_string")]
    pub trust_score: u8,
    pub verification_status: VerificationStatus,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub domain_verified_at: Option<DateTime<Utc>>,
    pub business_verified_at: Option<DateTime<Utc>>,
    /// Facts behind the current score, when they came from a full recompute.
    #[serde(default)]
    pub verification_data: Option<VerificationFacts>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DidMetadata {
    /// Metadata for a freshly minted DID: score 0, unverified.
    pub fn new(user_id: UserId, did_document: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            did_document,
            trust_score: 0,
            verification_status: VerificationStatus::Unverified,
            email_verified_at: None,
            domain_verified_at: None,
            business_verified_at: None,
            verification_data: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The `id` field of the stored DID Document.
    pub fn document_id(&self) -> Option<&str> {
        self.did_document.get("id").and_then(|v| v.as_str())
    }

    /// Best known facts for this DID: the last full snapshot if present,
    /// otherwise whatever the milestone timestamps say.
    pub fn known_facts(&self) -> VerificationFacts {
        self.verification_data.unwrap_or(VerificationFacts {
            email_verified: self.email_verified_at.is_some(),
            domain_verified: self.domain_verified_at.is_some(),
            business_verified: self.business_verified_at.is_some(),
            ..VerificationFacts::default()
        })
    }
}

mod score_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(score: &u8, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&score.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let score: u8 = raw.trim().parse().map_err(serde::de::Error::custom)?;
        if score > 100 {
            return Err(serde::de::Error::custom(format!(
                "trust score {} out of range 0-100",
                score
            )));
        }
        Ok(score)
    }
}

/// One issued email verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailVerification {
    pub id: Uuid,
    pub user_id: UserId,
    pub email: String,
    /// 6-digit numeric code.
    pub code: String,
    /// URL-safe bearer token. Unique.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl EmailVerification {
    pub fn new(
        user_id: UserId,
        email: String,
        code: String,
        token: String,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            email,
            code,
            token,
            expires_at,
            verified_at: None,
            created_at: now,
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.verified_at.is_some()
    }

    /// Expired once `now` reaches `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Unexpired and not yet consumed.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_consumed() && !self.is_expired(now)
    }
}

/// A user joined with its profile and DID metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user: User,
    pub profile: Option<Profile>,
    pub did_metadata: Option<DidMetadata>,
}

/// Non-sensitive fields safe for public display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub did: String,
    pub company_name: String,
    pub industry: Option<String>,
    pub bio: Option<String>,
    pub logo_url: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub trust_score: Option<u8>,
    pub verification_status: Option<VerificationStatus>,
    pub created_at: DateTime<Utc>,
}

impl PublicProfile {
    pub fn from_parts(user: &User, profile: &Profile, metadata: Option<&DidMetadata>) -> Self {
        Self {
            did: user.did.clone(),
            company_name: profile.data.company_name.clone(),
            industry: profile.data.industry.clone(),
            bio: profile.data.bio.clone(),
            logo_url: profile.data.logo_url.clone(),
            country: profile.data.country.clone(),
            website: profile.data.website.clone(),
            trust_score: metadata.map(|m| m.trust_score),
            verification_status: metadata.map(|m| m.verification_status),
            created_at: user.created_at,
        }
    }
}
