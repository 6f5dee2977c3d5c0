//! Diamond price model training and serving
//!
//! This crate provides the core functionality for:
//! - Loading and cleaning the diamond dataset
//! - A uniform model contract with linear and boosted-tree variants
//! - A versioned model registry backed by SQLite and artifact files
//! - The HTTP serving facade and its request log
//! - Configuration and observability

pub mod config;
pub mod dataset;
pub mod error;
pub mod model;
pub mod models;
pub mod observability;
pub mod registry;
pub mod serving;
pub mod store;
pub mod training;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use config::ServiceConfig;
pub use dataset::{load_dataset, Dataset, TargetPolicy};
pub use error::{DatasetError, ModelError, RegistryError, TrainingError, ValidationError};
pub use model::{get_model, DiamondModel, ModelKind, SupervisedModel};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use registry::{ModelRecord, ModelRegistry};
pub use training::train_new_model;
