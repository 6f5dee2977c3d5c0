//! Tabular data preparation for the diamond dataset
//!
//! Loads the CSV dataset and drops every row that cannot be used:
//! missing or non-numeric values, unknown grades, zero spatial
//! dimensions and (when the target is required) non-positive prices.

use crate::error::DatasetError;
use crate::models::{Category, Clarity, Color, Cut, Diamond, DiamondRow};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Minimum number of cleaned rows handed to a training pipeline
pub const MIN_TRAINING_ROWS: usize = 10;

/// Feature columns every dataset must provide
pub const FEATURE_COLUMNS: [&str; 9] = [
    "carat", "cut", "color", "clarity", "depth", "table", "x", "y", "z",
];

/// Target column name
pub const TARGET_COLUMN: &str = "price";

/// Whether the price column must be present and valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPolicy {
    /// Training data: rows without a positive price are dropped
    Required,
    /// New data: the price is kept when present and positive, ignored otherwise
    Optional,
}

/// One CSV record before cleaning
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    carat: Option<f64>,
    #[serde(default)]
    cut: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    clarity: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    depth: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    table: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    x: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    y: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    z: Option<f64>,
}

impl RawRow {
    fn into_row(self, policy: TargetPolicy) -> Option<DiamondRow> {
        let finite = |v: Option<f64>| v.filter(|v| v.is_finite());
        let dimension = |v: Option<f64>| finite(v).filter(|v| *v > 0.0);
        let label = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let diamond = Diamond {
            carat: finite(self.carat)?,
            cut: Cut::parse_label(&label(self.cut)?).ok()?,
            color: Color::parse_label(&label(self.color)?).ok()?,
            clarity: Clarity::parse_label(&label(self.clarity)?).ok()?,
            depth: finite(self.depth)?,
            table: finite(self.table)?,
            x: dimension(self.x)?,
            y: dimension(self.y)?,
            z: dimension(self.z)?,
        };

        let price = finite(self.price).filter(|p| *p > 0.0);
        if policy == TargetPolicy::Required && price.is_none() {
            return None;
        }

        Some(DiamondRow { diamond, price })
    }
}

/// Cleaned, in-memory dataset
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    name: String,
    rows: Vec<DiamondRow>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, rows: Vec<DiamondRow>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Dataset identifier recorded with trained models
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[DiamondRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature records in row order
    pub fn diamonds(&self) -> Vec<Diamond> {
        self.rows.iter().map(|r| r.diamond.clone()).collect()
    }

    /// Split into features and target, requiring a price on every row
    pub fn into_training_parts(self) -> Result<(Vec<Diamond>, Vec<f64>), DatasetError> {
        let mut diamonds = Vec::with_capacity(self.rows.len());
        let mut prices = Vec::with_capacity(self.rows.len());
        for row in self.rows {
            if let Some(price) = row.price {
                diamonds.push(row.diamond);
                prices.push(price);
            }
        }

        if prices.len() < MIN_TRAINING_ROWS {
            return Err(DatasetError::Insufficient {
                rows: prices.len(),
                required: MIN_TRAINING_ROWS,
            });
        }

        Ok((diamonds, prices))
    }
}

/// Dataset identifier derived from a file path (the file stem)
pub fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load and clean a CSV dataset
pub fn load_dataset(path: &Path, policy: TargetPolicy) -> Result<Dataset, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let name = dataset_name(path);
    read_dataset(BufReader::new(file), &name, policy)
}

/// Clean CSV content from any reader
pub fn read_dataset<R: std::io::Read>(
    reader: R,
    name: &str,
    policy: TargetPolicy,
) -> Result<Dataset, DatasetError> {
    // Ragged rows are dropped like any other unusable row
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader.headers()?.clone();
    let has_column = |column: &str| headers.iter().any(|h| h.trim() == column);
    if let Some(missing) = FEATURE_COLUMNS.iter().find(|c| !has_column(c)) {
        return Err(DatasetError::MissingColumn(missing.to_string()));
    }
    if policy == TargetPolicy::Required && !has_column(TARGET_COLUMN) {
        return Err(DatasetError::MissingColumn(TARGET_COLUMN.to_string()));
    }

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for record in reader.deserialize::<RawRow>() {
        let raw = match record {
            Ok(raw) => raw,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                debug!(dataset = %name, error = %e, "Skipping unreadable record");
                dropped += 1;
                continue;
            }
        };
        match raw.into_row(policy) {
            Some(row) => rows.push(row),
            None => dropped += 1,
        }
    }

    debug!(dataset = %name, dropped = dropped, "Dropped unusable rows");
    info!(dataset = %name, rows = rows.len(), dropped = dropped, "Dataset loaded");

    Ok(Dataset::new(name, rows))
}
