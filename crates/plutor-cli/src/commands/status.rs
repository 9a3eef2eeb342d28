//! `plutor status`: query the health of a running node.

use clap::Args;
use serde::Deserialize;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = super::DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
    storage: String,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/health", args.endpoint);

    match reqwest::get(&url).await {
        Ok(r) if r.status().is_success() => {
            let health: HealthResponse = r.json().await?;
            println!("Node Status:");
            println!("  Status:   {}", health.status);
            println!("  Version:  {}", health.version);
            println!("  Storage:  {}", health.storage);
        }
        Ok(r) => return Err(super::fail("status", r).await),
        Err(e) => super::unreachable_node(&args.endpoint, e),
    }

    Ok(())
}
