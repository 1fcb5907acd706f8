//! Spamwatch Daemon - spam/ham classification over HTTP
//!
//! Loads the classifier at startup and serves prediction, statistics and
//! management endpoints.

use anyhow::Result;
use clap::Parser;
use spamwatch_common::{SpamwatchConfig, VERSION};
use spamwatchd::server::{self, AppState};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spamwatchd")]
#[command(about = "Spamwatch - spam detection API daemon", long_about = None)]
#[command(version = VERSION)]
struct Args {
    /// Config file (defaults to $SPAMWATCH_CONFIG or /etc/spamwatch/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8000
    #[arg(long)]
    bind: Option<String>,

    /// Model weights (JSON)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Tokenizer exported by Tokenizer.to_json()
    #[arg(long)]
    tokenizer: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    info!("Spamwatch Daemon v{} starting", VERSION);

    let mut config = SpamwatchConfig::load(args.config.as_deref());
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(model) = args.model {
        config.model.model_path = model;
    }
    if let Some(tokenizer) = args.tokenizer {
        config.model.tokenizer_path = tokenizer;
    }

    let state = AppState::new(config);
    match state.reload_model().await {
        Ok(()) => info!("Model & tokenizer loaded on startup"),
        Err(e) => warn!("Model/tokenizer failed to load on startup: {}", e),
    }

    server::run(state).await
}
