//! Legacy JSON model-history log
//!
//! A pretty-printed JSON array with one entry per saved model version. The
//! SQLite record is authoritative; this file is kept for older tooling.

use super::ModelRecord;
use crate::model::Metrics;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Version")]
    pub version: u32,
    #[serde(rename = "Dataset")]
    pub dataset: String,
    #[serde(rename = "Metrics")]
    pub metrics: Metrics,
    #[serde(rename = "Creation date")]
    pub creation_date: String,
}

impl From<&ModelRecord> for HistoryEntry {
    fn from(record: &ModelRecord) -> Self {
        Self {
            model: record.name.clone(),
            version: record.version,
            dataset: record.training_dataset.clone(),
            metrics: record.metrics.clone(),
            creation_date: record.created_at.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries; a missing file is an empty log
    pub fn entries(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn append(&self, entry: HistoryEntry) -> anyhow::Result<()> {
        let mut entries = self.entries()?;
        entries.push(entry);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}
