//! Service configuration
//!
//! Read from an optional `diamond.{toml,json,yaml}` file in the working
//! directory, then overridden by `DIAMOND_*` environment variables
//! (e.g. `DIAMOND_API_PORT=9000`).

use crate::error::RegistryError;
use crate::model::{SplitOptions, TuningOptions};
use crate::registry::ModelRegistry;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "diamond";
const ENV_PREFIX: &str = "DIAMOND";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// Name attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Directory holding model artifacts
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// SQLite database with `models_history` and `api_history`
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Legacy JSON history log; empty disables it
    #[serde(default = "default_history_path")]
    pub history_path: Option<PathBuf>,

    #[serde(default = "default_dataset")]
    pub default_dataset: PathBuf,

    #[serde(default = "default_algorithm")]
    pub default_algorithm: String,

    #[serde(default = "default_api_host")]
    pub api_host: String,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Held-out share of the training split
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    #[serde(default = "default_seed")]
    pub split_seed: u64,

    /// Hyperparameter search budget, clamped to 100
    #[serde(default = "default_tuning_trials")]
    pub tuning_trials: usize,

    #[serde(default = "default_seed")]
    pub tuning_seed: u64,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "diamond-pricing".to_string())
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("models/saved_model")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("instance/app_db.sqlite")
}

fn default_history_path() -> Option<PathBuf> {
    Some(PathBuf::from("model_history.json"))
}

fn default_dataset() -> PathBuf {
    PathBuf::from("data/diamonds.csv")
}

fn default_algorithm() -> String {
    "gradient_boosting".to_string()
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_tuning_trials() -> usize {
    100
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            artifact_dir: default_artifact_dir(),
            db_path: default_db_path(),
            history_path: default_history_path(),
            default_dataset: default_dataset(),
            default_algorithm: default_algorithm(),
            api_host: default_api_host(),
            api_port: default_api_port(),
            test_size: default_test_size(),
            split_seed: default_seed(),
            tuning_trials: default_tuning_trials(),
            tuning_seed: default_seed(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `diamond.*` in the working directory and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit file (required when given) and the environment
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file_source)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        let mut loaded: ServiceConfig = config
            .try_deserialize()
            .context("Invalid configuration")?;

        if loaded
            .history_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            loaded.history_path = None;
        }
        Ok(loaded)
    }

    pub fn split_options(&self) -> SplitOptions {
        SplitOptions::new(self.test_size, self.split_seed)
    }

    pub fn tuning_options(&self) -> TuningOptions {
        TuningOptions::new(self.tuning_trials, self.tuning_seed)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Open the registry described by this configuration
    pub fn open_registry(&self) -> Result<ModelRegistry, RegistryError> {
        let registry = ModelRegistry::open(&self.db_path, &self.artifact_dir)?;
        Ok(match &self.history_path {
            Some(path) => registry.with_history_log(path),
            None => registry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.artifact_dir, PathBuf::from("models/saved_model"));
        assert_eq!(config.db_path, PathBuf::from("instance/app_db.sqlite"));
        assert_eq!(config.default_algorithm, "gradient_boosting");
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.split_options(), SplitOptions::new(0.2, 42));
        assert_eq!(config.tuning_options().effective_trials(), 100);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diamond.toml");
        std::fs::write(
            &path,
            "api_port = 9100\ndefault_algorithm = \"linear\"\nhistory_path = \"\"\n",
        )
        .unwrap();

        let config = ServiceConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.api_port, 9100);
        assert_eq!(config.default_algorithm, "linear");
        assert_eq!(config.history_path, None);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.bind_address(), "0.0.0.0:9100");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(ServiceConfig::load_from(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_open_registry_creates_database() {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig {
            db_path: dir.path().join("instance").join("app_db.sqlite"),
            artifact_dir: dir.path().join("models"),
            history_path: None,
            ..ServiceConfig::default()
        };
        let registry = config.open_registry().unwrap();
        assert!(config.db_path.exists());
        assert!(registry.history_log().is_none());
    }
}
