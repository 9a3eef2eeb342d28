use plutor_core::{VerificationFacts, VerificationStatus};
use serde::{Deserialize, Serialize};

/// Additive weights for the trust score, on a 0–100 scale.
///
/// - email verified:    20
/// - domain verified:   15
/// - business verified: 40
/// - invoice history:   0.5 per invoice, capped at 10
/// - on-time payments:  rate × 15, capped at 15
///
/// History and payment components only count once at least one invoice
/// exists; a payment rate without invoices is ignored.
const WEIGHT_EMAIL: f64 = 20.0;
const WEIGHT_DOMAIN: f64 = 15.0;
const WEIGHT_BUSINESS: f64 = 40.0;
const HISTORY_PER_INVOICE: f64 = 0.5;
const HISTORY_CAP: f64 = 10.0;
const PAYMENT_WEIGHT: f64 = 15.0;
const PAYMENT_CAP: f64 = 15.0;

pub const MAX_SCORE: u8 = 100;

const FULLY_VERIFIED_THRESHOLD: u8 = 70;
const VERIFIED_THRESHOLD: u8 = 50;
const BASIC_THRESHOLD: u8 = 30;

/// Compute the 0–100 trust score for a set of verification facts.
///
/// Pure and deterministic: it never reads or writes stored state.
pub fn calculate_trust_score(facts: &VerificationFacts) -> u8 {
    let mut score = 0.0;

    if facts.email_verified {
        score += WEIGHT_EMAIL;
    }
    if facts.domain_verified {
        score += WEIGHT_DOMAIN;
    }
    if facts.business_verified {
        score += WEIGHT_BUSINESS;
    }

    if facts.invoice_count > 0 {
        score += (f64::from(facts.invoice_count) * HISTORY_PER_INVOICE).min(HISTORY_CAP);

        if let Some(rate) = facts.on_time_payment_rate.filter(|r| r.is_finite()) {
            score += (rate.clamp(0.0, 1.0) * PAYMENT_WEIGHT).min(PAYMENT_CAP);
        }
    }

    score.round().clamp(0.0, f64::from(MAX_SCORE)) as u8
}

/// Map a score to its tier. Each band includes its lower bound.
pub fn verification_status(score: u8) -> VerificationStatus {
    match score {
        s if s >= FULLY_VERIFIED_THRESHOLD => VerificationStatus::FullyVerified,
        s if s >= VERIFIED_THRESHOLD => VerificationStatus::Verified,
        s if s >= BASIC_THRESHOLD => VerificationStatus::Basic,
        _ => VerificationStatus::Unverified,
    }
}

/// A score together with its tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustAssessment {
    pub score: u8,
    pub status: VerificationStatus,
}

impl TrustAssessment {
    pub fn from_facts(facts: &VerificationFacts) -> Self {
        let score = calculate_trust_score(facts);
        Self {
            score,
            status: verification_status(score),
        }
    }
}
