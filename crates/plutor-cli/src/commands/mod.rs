pub mod onboard;
pub mod profile;
pub mod score;
pub mod status;
pub mod verify;

use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Turn a non-success response into an error carrying the server's message.
pub async fn fail(action: &str, resp: reqwest::Response) -> anyhow::Error {
    let status = resp.status();
    match resp.json::<ErrorResponse>().await {
        Ok(err) => anyhow::anyhow!("{} failed (HTTP {}): {}", action, status, err.error),
        Err(_) => anyhow::anyhow!("{} failed (HTTP {})", action, status),
    }
}

pub fn unreachable_node(endpoint: &str, err: reqwest::Error) {
    println!("Could not reach node at {}", endpoint);
    println!("  Error: {}", err);
    println!();
    println!("Is the node running? Start it with: plutor-node");
}
