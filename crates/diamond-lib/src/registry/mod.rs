//! Model registry and version store
//!
//! The registry is the only authority on which model versions exist. It
//! assigns versions per model name, writes artifacts and records, and
//! resolves `(name, version)` back to a loadable model.
//!
//! Version assignment and the record insert happen inside one
//! `BEGIN IMMEDIATE` transaction, so concurrent writers on the same
//! database serialize on SQLite's write lock. A `UNIQUE(model_name,
//! model_version)` constraint backs this up; losing either race yields
//! [`RegistryError::Conflict`].

pub mod artifact;
pub mod history;

pub use history::{HistoryEntry, HistoryLog};

use crate::error::{ModelError, RegistryError};
use crate::model::{DiamondModel, Metrics, SupervisedModel};
use crate::store;
use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Timestamp format of `created`
pub const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One trained model version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub version: u32,
    pub training_dataset: String,
    pub metrics: Metrics,
    /// UTC, formatted with [`CREATED_FORMAT`]
    pub created_at: String,
    pub description: String,
    pub artifact_path: String,
}

impl ModelRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let metrics: String = row.get(3)?;
        // Non-finite metrics are stored as JSON null
        let metrics: BTreeMap<String, Option<f64>> =
            serde_json::from_str(&metrics).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
            })?;
        let metrics = metrics
            .into_iter()
            .map(|(name, value)| (name, value.unwrap_or(f64::NAN)))
            .collect();

        Ok(Self {
            name: row.get(0)?,
            version: row.get(1)?,
            training_dataset: row.get(2)?,
            metrics,
            created_at: row.get(4)?,
            description: row.get(5)?,
            artifact_path: row.get(6)?,
        })
    }
}

const RECORD_COLUMNS: &str = "model_name, model_version, training_dataset, metrics, created, \
                              model_description, model_pickle_path";

#[derive(Debug)]
pub struct ModelRegistry {
    db_path: PathBuf,
    artifact_dir: PathBuf,
    history: Option<HistoryLog>,
    // Serializes saves within this process; SQLite's lock covers other processes
    write_lock: Mutex<()>,
}

impl ModelRegistry {
    /// Open the registry, creating the database schema if needed
    pub fn open(
        db_path: impl Into<PathBuf>,
        artifact_dir: impl Into<PathBuf>,
    ) -> Result<Self, RegistryError> {
        let registry = Self {
            db_path: db_path.into(),
            artifact_dir: artifact_dir.into(),
            history: None,
            write_lock: Mutex::new(()),
        };
        registry.connect()?;
        Ok(registry)
    }

    /// Also append every saved version to a legacy JSON history file
    pub fn with_history_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.history = Some(HistoryLog::new(path));
        self
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn history_log(&self) -> Option<&HistoryLog> {
        self.history.as_ref()
    }

    fn connect(&self) -> Result<Connection, RegistryError> {
        Ok(store::open(&self.db_path)?)
    }

    /// Version the next save of `name` would receive
    pub fn next_version(&self, name: &str) -> Result<u32, RegistryError> {
        let conn = self.connect()?;
        Ok(max_version(&conn, name)?.map_or(1, |v| v + 1))
    }

    /// Persist a fitted model as the next version of its name.
    ///
    /// The artifact is written before the record; if the artifact cannot be
    /// written the transaction is rolled back and no record exists.
    pub fn save(
        &self,
        model: &DiamondModel,
        dataset_name: &str,
    ) -> Result<ModelRecord, RegistryError> {
        let name = model.model_name();
        if !model.is_fitted() {
            return Err(ModelError::NotFitted(name.to_string()).into());
        }

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        fs::create_dir_all(&self.artifact_dir)
            .map_err(|e| RegistryError::io(&self.artifact_dir, e))?;

        let mut conn = self.connect()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| conflict_or(e, name))?;

        let version = max_version(&tx, name)?.map_or(1, |v| v + 1);
        let path = artifact::artifact_path(&self.artifact_dir, name, version);

        // Dropping `tx` on error rolls back
        let written = artifact::write(&path, model)?;

        let record = ModelRecord {
            name: name.to_string(),
            version,
            training_dataset: dataset_name.to_string(),
            metrics: model.metrics().clone(),
            created_at: Utc::now().format(CREATED_FORMAT).to_string(),
            description: model.model_description().to_string(),
            artifact_path: path.display().to_string(),
        };
        let metrics_json = serde_json::to_string(&record.metrics)
            .map_err(|e| RegistryError::Serialization(e.to_string()))?;

        tx.execute(
            &format!(
                "INSERT INTO models_history ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                RECORD_COLUMNS
            ),
            (
                &record.name,
                record.version,
                &record.training_dataset,
                &metrics_json,
                &record.created_at,
                &record.description,
                &record.artifact_path,
            ),
        )
        .map_err(|e| conflict_or(e, name))?;
        tx.commit().map_err(|e| conflict_or(e, name))?;

        info!(
            model_name = %record.name,
            model_version = record.version,
            path = %record.artifact_path,
            checksum = %written.checksum,
            size_bytes = written.size_bytes,
            "Saved model version"
        );

        if let Some(history) = &self.history {
            if let Err(e) = history.append(HistoryEntry::from(&record)) {
                warn!(
                    path = %history.path().display(),
                    error = %e,
                    "Failed to append legacy model history"
                );
            }
        }

        Ok(record)
    }

    /// Record for `name` at `version`, or at its latest version when `None`
    pub fn record(&self, name: &str, version: Option<u32>) -> Result<ModelRecord, RegistryError> {
        let conn = self.connect()?;
        let record = match version {
            Some(v) => conn
                .query_row(
                    &format!(
                        "SELECT {} FROM models_history WHERE model_name = ?1 AND model_version = ?2",
                        RECORD_COLUMNS
                    ),
                    (name, v),
                    ModelRecord::from_row,
                )
                .optional()?,
            None => conn
                .query_row(
                    &format!(
                        "SELECT {} FROM models_history WHERE model_name = ?1 \
                         ORDER BY model_version DESC LIMIT 1",
                        RECORD_COLUMNS
                    ),
                    [name],
                    ModelRecord::from_row,
                )
                .optional()?,
        };

        record.ok_or_else(|| match version {
            Some(v) => RegistryError::NotFound(format!("Model '{}' has no version {}", name, v)),
            None => RegistryError::NotFound(format!("Model '{}' has no trained versions", name)),
        })
    }

    /// Artifact path for `name` at `version`, or at its latest version
    pub fn resolve_path(&self, name: &str, version: Option<u32>) -> Result<PathBuf, RegistryError> {
        Ok(PathBuf::from(self.record(name, version)?.artifact_path))
    }

    /// Resolve and deserialize a model.
    ///
    /// A missing record, a missing artifact and a corrupt artifact are all
    /// reported as [`RegistryError::NotFound`].
    pub fn load(&self, name: &str, version: Option<u32>) -> Result<DiamondModel, RegistryError> {
        let path = self.resolve_path(name, version)?;
        let model = artifact::read(&path)?;

        if model.model_name() != name {
            warn!(
                expected = %name,
                found = %model.model_name(),
                path = %path.display(),
                "Artifact holds a different model"
            );
            return Err(RegistryError::NotFound(format!(
                "Model artifact {} does not hold model '{}'",
                path.display(),
                name
            )));
        }

        debug!(model_name = %name, version = ?version, path = %path.display(), "Loaded model");
        Ok(model)
    }

    /// All records, optionally for one name, ordered by name then version
    pub fn list(&self, name: Option<&str>) -> Result<Vec<ModelRecord>, RegistryError> {
        let conn = self.connect()?;
        let records = match name {
            Some(name) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM models_history WHERE model_name = ?1 ORDER BY model_version",
                    RECORD_COLUMNS
                ))?;
                let rows = stmt.query_map([name], ModelRecord::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM models_history ORDER BY model_name, model_version",
                    RECORD_COLUMNS
                ))?;
                let rows = stmt.query_map([], ModelRecord::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(records)
    }

    /// Records whose artifact file no longer exists
    pub fn dangling_records(&self) -> Result<Vec<ModelRecord>, RegistryError> {
        Ok(self
            .list(None)?
            .into_iter()
            .filter(|r| !Path::new(&r.artifact_path).exists())
            .collect())
    }

    /// Delete every artifact file; records are left untouched and become
    /// dangling. Returns the number of files removed.
    pub fn purge_all_artifacts(&self) -> Result<usize, RegistryError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let removed = artifact::remove_all(&self.artifact_dir)?;
        warn!(
            dir = %self.artifact_dir.display(),
            removed = removed,
            "Purged model artifacts"
        );
        Ok(removed)
    }
}

fn max_version(conn: &Connection, name: &str) -> Result<Option<u32>, RegistryError> {
    Ok(conn.query_row(
        "SELECT MAX(model_version) FROM models_history WHERE model_name = ?1",
        [name],
        |row| row.get(0),
    )?)
}

/// Map lock contention and uniqueness violations to `Conflict`
fn conflict_or(e: rusqlite::Error, name: &str) -> RegistryError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation)
        | Some(ErrorCode::DatabaseBusy)
        | Some(ErrorCode::DatabaseLocked) => RegistryError::Conflict {
            name: name.to_string(),
        },
        _ => RegistryError::Database(e),
    }
}

#[cfg(test)]
mod tests;
