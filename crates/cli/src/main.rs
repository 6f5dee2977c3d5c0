//! Diamond pricing CLI
//!
//! Trains and registers models, inspects the model history, purges
//! artifacts, and queries a running pricing service.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{models, predict, train};
use diamond_lib::ServiceConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Diamond pricing CLI
#[derive(Parser)]
#[command(name = "diamond")]
#[command(author, version, about = "CLI for the diamond pricing service", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./diamond.{toml,json,yaml} when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API endpoint URL (can also be set via DIAMOND_API_URL env var)
    #[arg(long, env = "DIAMOND_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a model and register it as a new version
    Train {
        /// Dataset CSV (defaults to the configured dataset)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Model name, e.g. linear_regression or gradient_boosting
        #[arg(long)]
        model: Option<String>,
    },

    /// List registered model versions
    Models {
        /// Only show versions of this model
        #[arg(long, short)]
        name: Option<String>,
    },

    /// Delete every saved model artifact
    Purge {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Predict the price of a diamond through the API
    Predict {
        /// Diamond attributes as a JSON object
        #[arg(long)]
        data: String,

        /// Model name (the server default when omitted)
        #[arg(long, short)]
        model: Option<String>,

        /// Model version (the latest when omitted)
        #[arg(long)]
        version: Option<u32>,
    },

    /// Find dataset diamonds of the same grade with the nearest carat
    Similar {
        /// Diamond attributes as a JSON object
        #[arg(long)]
        data: String,

        /// Number of diamonds to return
        #[arg(long, short, default_value = "5")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Train { dataset, model } => {
            let config = ServiceConfig::load_from(cli.config.as_deref())?;
            train::train(config, dataset, model, cli.format).await?;
        }
        Commands::Models { name } => {
            let config = ServiceConfig::load_from(cli.config.as_deref())?;
            models::list_models(&config, name.as_deref(), cli.format)?;
        }
        Commands::Purge { yes } => {
            let config = ServiceConfig::load_from(cli.config.as_deref())?;
            models::purge_artifacts(&config, yes, cli.format)?;
        }
        Commands::Predict {
            data,
            model,
            version,
        } => {
            let client = client::ApiClient::new(&cli.api_url)?;
            predict::predict_price(&client, &data, model.as_deref(), version, cli.format).await?;
        }
        Commands::Similar { data, count } => {
            let client = client::ApiClient::new(&cli.api_url)?;
            predict::similar_diamonds(&client, &data, count, cli.format).await?;
        }
    }

    Ok(())
}
