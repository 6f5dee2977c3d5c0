//! Diamond pricing service
//!
//! Serves price predictions from any trained model version and
//! similar-diamond lookups over the canonical dataset.

use anyhow::{Context, Result};
use diamond_lib::{
    load_dataset, serving::AppState, ServiceConfig, StructuredLogger, TargetPolicy,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting diamond-server");

    let config = ServiceConfig::load()?;
    info!(
        db_path = %config.db_path.display(),
        artifact_dir = %config.artifact_dir.display(),
        default_model = %config.default_algorithm,
        "Service configured"
    );

    let registry = config
        .open_registry()
        .with_context(|| format!("Failed to open registry at {}", config.db_path.display()))?;

    let dataset = load_dataset(&config.default_dataset, TargetPolicy::Optional).with_context(|| {
        format!(
            "Failed to load dataset {}",
            config.default_dataset.display()
        )
    })?;
    if dataset.is_empty() {
        warn!(
            dataset = %config.default_dataset.display(),
            "Dataset has no usable rows, similarity lookups will return nothing"
        );
    }

    let logger = StructuredLogger::new(&config.instance_name);
    let address = config.bind_address();
    logger.log_startup(SERVICE_VERSION, &address, dataset.len());

    let state = Arc::new(AppState::new(
        Arc::new(registry),
        Arc::new(dataset),
        config.default_algorithm.clone(),
        logger.clone(),
    ));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
        }
    };
    api::serve(&address, state, shutdown).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
