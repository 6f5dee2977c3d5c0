//! Model history and artifact maintenance

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use diamond_lib::{
    model::metrics::{MAE, R2},
    ModelKind, ModelRecord, ServiceConfig, StructuredLogger,
};
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    name: String,
    #[tabled(rename = "Version")]
    version: u32,
    #[tabled(rename = "Dataset")]
    dataset: String,
    #[tabled(rename = "R²")]
    r2: String,
    #[tabled(rename = "MAE")]
    mae: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&ModelRecord> for ModelRow {
    fn from(record: &ModelRecord) -> Self {
        Self {
            name: record.name.clone(),
            version: record.version,
            dataset: record.training_dataset.clone(),
            r2: output::color_r2(record.metrics.get(R2).copied()),
            mae: record
                .metrics
                .get(MAE)
                .map(|mae| output::format_metric(*mae))
                .unwrap_or_else(|| "-".to_string()),
            created: output::format_timestamp(&record.created_at),
        }
    }
}

/// Registry name for a model name or alias
fn canonical_name(name: Option<&str>) -> Result<Option<&'static str>> {
    name.map(|n| n.parse::<ModelKind>().map(|kind| kind.canonical_name()))
        .transpose()
        .context("Unknown model name")
}

/// List registered versions, optionally for one model name
pub fn list_models(config: &ServiceConfig, name: Option<&str>, format: OutputFormat) -> Result<()> {
    let name = canonical_name(name)?;
    let registry = config.open_registry().context("Failed to open model registry")?;
    let records = registry.list(name).context("Failed to list models")?;

    if records.is_empty() && format == OutputFormat::Table {
        output::print_warning("No trained models found");
        return Ok(());
    }

    let rows: Vec<ModelRow> = records.iter().map(ModelRow::from).collect();
    output::print_table(rows, &records, format);

    Ok(())
}

#[derive(Serialize)]
struct PurgeReport {
    removed: usize,
    dangling_records: usize,
}

/// Delete every artifact file, keeping the history records
pub fn purge_artifacts(config: &ServiceConfig, confirmed: bool, format: OutputFormat) -> Result<()> {
    let registry = config.open_registry().context("Failed to open model registry")?;

    if !confirmed {
        output::print_warning(&format!(
            "This deletes every artifact in {}. Re-run with --yes to confirm.",
            registry.artifact_dir().display()
        ));
        return Ok(());
    }

    let removed = registry
        .purge_all_artifacts()
        .context("Failed to purge artifacts")?;
    let dangling = registry
        .dangling_records()
        .context("Failed to check model records")?;
    StructuredLogger::new(&config.instance_name).log_artifacts_purged(removed, dangling.len());

    let report = PurgeReport {
        removed,
        dangling_records: dangling.len(),
    };
    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Table => {
            output::print_success(&format!("Removed {} artifact(s)", removed));
            if !dangling.is_empty() {
                output::print_info(&format!(
                    "{} model record(s) now point at missing artifacts",
                    dangling.len()
                ));
            }
        }
    }

    Ok(())
}
