//! `plutor onboard`: register a wallet and email.

use clap::Args;
use serde::{Deserialize, Serialize};

#[derive(Args, Debug)]
pub struct OnboardArgs {
    /// Solana wallet address (base58).
    #[arg(short, long)]
    pub wallet: String,

    /// Contact email; the verification code is sent here.
    #[arg(short = 'm', long)]
    pub email: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = super::DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct CreateUserRequest<'a> {
    wallet_address: &'a str,
    email: &'a str,
}

#[derive(Deserialize)]
struct CreateUserResponse {
    user_id: String,
    did: String,
    verification_expires_at: String,
}

pub async fn run(args: &OnboardArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/users", args.endpoint);
    let body = CreateUserRequest {
        wallet_address: &args.wallet,
        email: &args.email,
    };

    let client = reqwest::Client::new();
    match client.post(&url).json(&body).send().await {
        Ok(r) if r.status().is_success() => {
            let data: CreateUserResponse = r.json().await?;
            println!("User registered!");
            println!("  User ID:  {}", data.user_id);
            println!("  DID:      {}", data.did);
            println!("  Verify your email before {}", data.verification_expires_at);
        }
        Ok(r) => return Err(super::fail("registration", r).await),
        Err(e) => super::unreachable_node(&args.endpoint, e),
    }

    Ok(())
}
