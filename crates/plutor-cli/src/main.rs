//! Plutor CLI: command-line client for the identity service.
//!
//! Subcommands: status, onboard, verify, verify-code, complete-profile,
//! score, profile, search.

mod commands;

use clap::{Parser, Subcommand};

/// Plutor: wallet identity and trust scoring for invoice financing.
#[derive(Parser, Debug)]
#[command(name = "plutor", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Query the health of a running node.
    Status(commands::status::StatusArgs),
    /// Register a wallet and email.
    Onboard(commands::onboard::OnboardArgs),
    /// Confirm an email with the emailed token.
    Verify(commands::verify::VerifyArgs),
    /// Confirm an email with the 6-digit code.
    VerifyCode(commands::verify::VerifyCodeArgs),
    /// Submit the business profile and finish onboarding.
    CompleteProfile(commands::profile::CompleteProfileArgs),
    /// Recompute a user's trust score from verification facts.
    Score(commands::score::ScoreArgs),
    /// Show the public profile behind a DID.
    Profile(commands::profile::ProfileArgs),
    /// Search businesses by company name.
    Search(commands::profile::SearchArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Onboard(args) => commands::onboard::run(args).await,
        Commands::Verify(args) => commands::verify::run_token(args).await,
        Commands::VerifyCode(args) => commands::verify::run_code(args).await,
        Commands::CompleteProfile(args) => commands::profile::run_complete(args).await,
        Commands::Score(args) => commands::score::run(args).await,
        Commands::Profile(args) => commands::profile::run_show(args).await,
        Commands::Search(args) => commands::profile::run_search(args).await,
    }
}
