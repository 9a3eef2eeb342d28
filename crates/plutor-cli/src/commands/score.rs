//! `plutor score`: recompute a user's trust score.

use clap::Args;
use serde::{Deserialize, Serialize};

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// User ID to rescore.
    #[arg(short, long)]
    pub user: String,

    /// Email ownership confirmed.
    #[arg(long)]
    pub email_verified: bool,

    /// Company domain confirmed.
    #[arg(long)]
    pub domain_verified: bool,

    /// Business registration confirmed.
    #[arg(long)]
    pub business_verified: bool,

    /// Number of invoices financed so far.
    #[arg(long, default_value_t = 0)]
    pub invoices: u32,

    /// Fraction of invoices paid on time (0.0 to 1.0).
    #[arg(long)]
    pub on_time_rate: Option<f64>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = super::DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct VerificationFacts {
    email_verified: bool,
    domain_verified: bool,
    business_verified: bool,
    invoice_count: u32,
    on_time_payment_rate: Option<f64>,
}

#[derive(Deserialize)]
struct DidMetadata {
    trust_score: String,
    verification_status: String,
}

pub async fn run(args: &ScoreArgs) -> anyhow::Result<()> {
    if let Some(rate) = args.on_time_rate {
        if !(0.0..=1.0).contains(&rate) {
            anyhow::bail!("on-time rate must be between 0.0 and 1.0");
        }
    }

    let url = format!("{}/api/v1/users/{}/trust-score", args.endpoint, args.user);
    let body = VerificationFacts {
        email_verified: args.email_verified,
        domain_verified: args.domain_verified,
        business_verified: args.business_verified,
        invoice_count: args.invoices,
        on_time_payment_rate: args.on_time_rate,
    };

    let client = reqwest::Client::new();
    match client.put(&url).json(&body).send().await {
        Ok(r) if r.status().is_success() => {
            let data: DidMetadata = r.json().await?;
            println!("Trust score updated!");
            println!("  Score:   {}", data.trust_score);
            println!("  Status:  {}", data.verification_status);
        }
        Ok(r) => return Err(super::fail("score update", r).await),
        Err(e) => super::unreachable_node(&args.endpoint, e),
    }

    Ok(())
}
