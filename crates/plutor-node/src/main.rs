//! Plutor identity service entry point.
//!
//! Starts the HTTP API with configuration from a TOML file or defaults.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use plutor_node::{PlutorConfig, PlutorNode, StorageBackend};

/// Plutor Identity Service
#[derive(Parser, Debug)]
#[command(name = "plutor-node", version, about = "Plutor identity and trust-scoring service")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "plutor.toml")]
    config: PathBuf,

    /// Override the API port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep everything in memory instead of RocksDB.
    #[arg(long)]
    memory: bool,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON logs.
    #[arg(long)]
    json_logs: bool,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.init {
        init_tracing("info", "text");
        let config = PlutorConfig::default();
        config.save(&args.config)?;
        tracing::info!(path = %args.config.display(), "wrote default config");
        return Ok(());
    }

    let mut config = PlutorConfig::load(&args.config)?;

    // CLI overrides
    if let Some(api_port) = args.api_port {
        config.api.port = api_port;
    }
    if let Some(ref data_dir) = args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if args.memory {
        config.storage.backend = StorageBackend::Memory;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if args.json_logs {
        config.logging.format = "json".into();
    }

    init_tracing(&config.logging.level, &config.logging.format);
    tracing::info!("Plutor identity service v{}", env!("CARGO_PKG_VERSION"));

    let node = PlutorNode::new(config)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        tracing::info!("received shutdown signal");
    };

    if let Err(e) = node.run(shutdown).await {
        tracing::error!(error = %e, "API server error");
    }

    node.shutdown().await?;
    tracing::info!("Plutor node exited cleanly");
    Ok(())
}
