//! Error types shared across the library

use thiserror::Error;

/// Failures while loading or cleaning a dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to open dataset {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Dataset has {rows} usable rows after cleaning, at least {required} are required")]
    Insufficient { rows: usize, required: usize },
}

/// Invalid input at the API boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("Missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Field '{field}' must be a number")]
    NotNumeric { field: String },

    #[error("Field '{field}' must be greater than zero")]
    NotPositive { field: String },

    #[error(transparent)]
    UnknownCategory(#[from] crate::models::UnknownCategory),

    #[error("Field '{field}' {reason}")]
    Invalid { field: String, reason: String },
}

/// Failures inside the model contract
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model '{0}' is not supported")]
    UnsupportedModel(String),

    #[error("Model '{0}' has not been fitted")]
    NotFitted(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    #[error("Estimator failed: {0}")]
    Estimator(String),
}

/// Failures of the model registry and the record store
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0}")]
    NotFound(String),

    #[error("A concurrent save of model '{name}' claimed the next version, retry the save")]
    Conflict { name: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl RegistryError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        RegistryError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// True for failures a caller may resolve by retrying the operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::Conflict { .. })
    }
}

/// Failures of the train-and-save pipeline
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
