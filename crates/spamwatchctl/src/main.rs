//! Spamwatch Control - CLI client for the Spamwatch daemon
//!
//! Sends messages and files for classification and manages the daemon.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use spamwatch_common::VERSION;
use spamwatchctl::client::{SpamwatchClient, DEFAULT_URL};
use spamwatchctl::display;
use spamwatchctl::errors::{ClientError, EXIT_GENERAL_ERROR, EXIT_SUCCESS};
use spamwatchctl::export::{self, ExportFormat};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "spamwatchctl")]
#[command(about = "Spamwatch - spam detection client", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Daemon base URL
    #[arg(long, global = true, env = "SPAMWATCH_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Print raw JSON responses
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single message
    Predict {
        message: String,
    },

    /// Classify several messages in one request
    Batch {
        /// Messages to classify
        messages: Vec<String>,

        /// Read messages from a file, one per line
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Upload a .csv or .txt file for classification
    Upload {
        file: PathBuf,
    },

    /// Show model metrics and prediction history
    Stats,

    /// Check daemon and model health
    Health,

    /// Show the daemon's API version and endpoints
    Info,

    /// Clear prediction history
    ClearHistory,

    /// Reload model and tokenizer from disk
    Reload,

    /// Export recent predictions
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output path (defaults to spam_predictions.csv / model_statistics.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let client = SpamwatchClient::new(&cli.url)?;

    match cli.command {
        Commands::Predict { message } => {
            let resp = client.predict(&message).await?;
            if cli.json {
                print_json(&resp)?;
            } else {
                display::print_prediction(&resp);
            }
        }
        Commands::Batch { mut messages, from } => {
            if let Some(path) = from {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                messages.extend(content.lines().map(str::to_string));
            }
            let resp = client.predict_batch(messages).await?;
            if cli.json {
                print_json(&resp)?;
            } else {
                display::print_batch(&resp);
            }
        }
        Commands::Upload { file } => {
            let resp = client.predict_file(&file).await?;
            if cli.json {
                print_json(&resp)?;
            } else {
                display::print_file(&resp);
            }
        }
        Commands::Stats => {
            let stats = client.statistics().await?;
            if cli.json {
                print_json(&stats)?;
            } else {
                display::print_statistics(&stats);
            }
        }
        Commands::Health => {
            let health = client.health().await?;
            if cli.json {
                print_json(&health)?;
            } else {
                display::print_health(&health);
            }
        }
        Commands::Info => {
            let info = client.info().await?;
            if cli.json {
                print_json(&info)?;
            } else {
                display::print_info(client.base_url(), &info);
            }
        }
        Commands::ClearHistory => {
            let resp = client.clear_history().await?;
            if cli.json {
                print_json(&resp)?;
            } else {
                display::print_action(&resp);
            }
        }
        Commands::Reload => {
            let resp = client.reload_model().await?;
            if cli.json {
                print_json(&resp)?;
            } else {
                display::print_action(&resp);
            }
        }
        Commands::Export { format, output } => {
            let stats = client.statistics().await?;
            let path = output.unwrap_or_else(|| PathBuf::from(format.default_filename()));
            let written = export::write_export(format, &stats, &path)?;
            println!("Exported {} predictions to {}", written, path.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            match e.downcast_ref::<ClientError>() {
                Some(client_err) => {
                    eprintln!("error: {}", client_err);
                    client_err.exit_code
                }
                None => {
                    eprintln!("error: {:#}", e);
                    EXIT_GENERAL_ERROR
                }
            }
        }
    };
    std::process::exit(code);
}
