//! `plutor verify` and `plutor verify-code`: confirm an email address.

use clap::Args;
use serde::{Deserialize, Serialize};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Token from the verification link.
    pub token: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = super::DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Args, Debug)]
pub struct VerifyCodeArgs {
    /// User ID returned by `plutor onboard`.
    #[arg(short, long)]
    pub user: String,

    /// 6-digit code from the verification email.
    pub code: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = super::DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    verified: bool,
}

#[derive(Serialize)]
struct CodeRequest<'a> {
    code: &'a str,
}

#[derive(Deserialize)]
struct TrustAssessment {
    score: u8,
    status: String,
}

pub async fn run_token(args: &VerifyArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/verify-email", args.endpoint);
    let client = reqwest::Client::new();

    match client
        .post(&url)
        .json(&TokenRequest { token: &args.token })
        .send()
        .await
    {
        Ok(r) if r.status().is_success() => {
            let data: TokenResponse = r.json().await?;
            if data.verified {
                println!("Email verified.");
            } else {
                anyhow::bail!("token is invalid, expired or already used");
            }
        }
        Ok(r) => return Err(super::fail("verification", r).await),
        Err(e) => super::unreachable_node(&args.endpoint, e),
    }

    Ok(())
}

pub async fn run_code(args: &VerifyCodeArgs) -> anyhow::Result<()> {
    if args.code.len() != 6 || !args.code.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("code must be 6 digits");
    }

    let url = format!("{}/api/v1/users/{}/verify-code", args.endpoint, args.user);
    let client = reqwest::Client::new();

    match client
        .post(&url)
        .json(&CodeRequest { code: &args.code })
        .send()
        .await
    {
        Ok(r) if r.status().is_success() => {
            let data: TrustAssessment = r.json().await?;
            println!("Email verified!");
            println!("  Trust score:  {}", data.score);
            println!("  Status:       {}", data.status);
        }
        Ok(r) => return Err(super::fail("verification", r).await),
        Err(e) => super::unreachable_node(&args.endpoint, e),
    }

    Ok(())
}
