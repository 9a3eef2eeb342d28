//! `plutor complete-profile`, `plutor profile` and `plutor search`.

use clap::Args;
use serde::{Deserialize, Serialize};

#[derive(Args, Debug)]
pub struct CompleteProfileArgs {
    /// User ID returned by `plutor onboard`.
    #[arg(short, long)]
    pub user: String,

    /// Registered company name.
    #[arg(short, long)]
    pub company: String,

    /// ISO 3166-1 alpha-2 country code.
    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub industry: Option<String>,

    #[arg(long)]
    pub tax_id: Option<String>,

    #[arg(long)]
    pub website: Option<String>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = super::DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// The DID to look up.
    pub did: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = super::DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Part of the company name.
    pub term: String,

    /// Maximum results.
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// API endpoint of the node.
    #[arg(short, long, default_value = super::DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct ProfileData<'a> {
    company_name: &'a str,
    country: Option<&'a str>,
    industry: Option<&'a str>,
    tax_id: Option<&'a str>,
    website: Option<&'a str>,
}

#[derive(Deserialize)]
struct PublicProfile {
    did: String,
    company_name: String,
    industry: Option<String>,
    country: Option<String>,
    website: Option<String>,
    trust_score: Option<u8>,
    verification_status: Option<String>,
}

impl PublicProfile {
    fn print(&self) {
        println!("{}", self.company_name);
        println!("  DID:       {}", self.did);
        if let Some(industry) = &self.industry {
            println!("  Industry:  {}", industry);
        }
        if let Some(country) = &self.country {
            println!("  Country:   {}", country);
        }
        if let Some(website) = &self.website {
            println!("  Website:   {}", website);
        }
        match (self.trust_score, &self.verification_status) {
            (Some(score), Some(status)) => println!("  Trust:     {} ({})", score, status),
            _ => println!("  Trust:     (none)"),
        }
    }
}

pub async fn run_complete(args: &CompleteProfileArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/users/{}/profile", args.endpoint, args.user);
    let body = ProfileData {
        company_name: &args.company,
        country: args.country.as_deref(),
        industry: args.industry.as_deref(),
        tax_id: args.tax_id.as_deref(),
        website: args.website.as_deref(),
    };

    let client = reqwest::Client::new();
    match client.post(&url).json(&body).send().await {
        Ok(r) if r.status().is_success() => {
            println!("Onboarding complete for {}.", args.company);
        }
        Ok(r) => return Err(super::fail("profile submission", r).await),
        Err(e) => super::unreachable_node(&args.endpoint, e),
    }

    Ok(())
}

pub async fn run_show(args: &ProfileArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/profiles/{}", args.endpoint, args.did);

    match reqwest::get(&url).await {
        Ok(r) if r.status().is_success() => {
            let profile: PublicProfile = r.json().await?;
            profile.print();
        }
        Ok(r) => return Err(super::fail("lookup", r).await),
        Err(e) => super::unreachable_node(&args.endpoint, e),
    }

    Ok(())
}

pub async fn run_search(args: &SearchArgs) -> anyhow::Result<()> {
    let url = format!("{}/api/v1/profiles", args.endpoint);
    let client = reqwest::Client::new();
    let limit = args.limit.to_string();

    match client
        .get(&url)
        .query(&[("q", args.term.as_str()), ("limit", limit.as_str())])
        .send()
        .await
    {
        Ok(r) if r.status().is_success() => {
            let profiles: Vec<PublicProfile> = r.json().await?;
            if profiles.is_empty() {
                println!("No companies match \"{}\".", args.term);
            }
            for profile in &profiles {
                profile.print();
            }
        }
        Ok(r) => return Err(super::fail("search", r).await),
        Err(e) => super::unreachable_node(&args.endpoint, e),
    }

    Ok(())
}
