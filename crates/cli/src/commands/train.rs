//! Train and register a model

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use diamond_lib::{train_new_model, ServiceConfig};
use std::path::PathBuf;
use tracing::debug;

/// Train `model` on `dataset` (configured defaults when omitted) and
/// print the metrics of the saved version
pub async fn train(
    config: ServiceConfig,
    dataset: Option<PathBuf>,
    model: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let dataset = dataset.unwrap_or_else(|| config.default_dataset.clone());
    let model = model.unwrap_or_else(|| config.default_algorithm.clone());
    debug!(dataset = %dataset.display(), model = %model, "Training");

    let description = format!("{} on {}", model, dataset.display());
    let record = tokio::task::spawn_blocking(move || train_new_model(&dataset, &model, &config))
        .await
        .context("Training task panicked")?
        .with_context(|| format!("Failed to train {}", description))?;

    match format {
        OutputFormat::Json => output::print_json(&record),
        OutputFormat::Table => {
            output::print_success(&format!(
                "Saved {} version {} to {}",
                record.name, record.version, record.artifact_path
            ));
            for (metric, value) in &record.metrics {
                println!("{}: {}", metric, output::format_metric(*value));
            }
        }
    }

    Ok(())
}
