//! Train-and-save entry point

use crate::config::ServiceConfig;
use crate::dataset::{dataset_name, load_dataset, TargetPolicy};
use crate::error::TrainingError;
use crate::model::{get_model, metrics, SupervisedModel};
use crate::observability::{ServiceMetrics, StructuredLogger};
use crate::registry::{ModelRecord, ModelRegistry};
use std::path::Path;
use tracing::info;

/// Load and clean `dataset_path`, train `model_name` on it and save the
/// result as that model's next version.
pub fn train_new_model(
    dataset_path: &Path,
    model_name: &str,
    config: &ServiceConfig,
) -> Result<ModelRecord, TrainingError> {
    let registry = config.open_registry()?;
    train_with_registry(dataset_path, model_name, config, &registry)
}

/// [`train_new_model`] against an already opened registry
pub fn train_with_registry(
    dataset_path: &Path,
    model_name: &str,
    config: &ServiceConfig,
    registry: &ModelRegistry,
) -> Result<ModelRecord, TrainingError> {
    // Resolve the variant before touching the data
    let mut model = get_model(model_name, config.tuning_options())?;
    let logger = StructuredLogger::new(&config.instance_name);

    let dataset = load_dataset(dataset_path, TargetPolicy::Required)?;
    let name = dataset_name(dataset_path);
    let rows = dataset.len();
    info!(
        model_name = %model.model_name(),
        dataset = %name,
        rows = rows,
        "Training model"
    );

    let (x, y) = dataset.into_training_parts()?;
    let scores = model.train_pipeline(&x, &y, config.split_options())?;
    logger.log_model_trained(
        model.model_name(),
        &name,
        rows,
        scores.get(metrics::R2).copied().unwrap_or(f64::NAN),
        scores.get(metrics::MAE).copied().unwrap_or(f64::NAN),
    );

    let record = registry.save(&model, &name)?;
    ServiceMetrics::new().inc_models_saved();
    logger.log_model_saved(&record.name, record.version, &record.artifact_path);

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, RegistryError};
    use crate::test_support::{synthetic_rows, to_csv};
    use std::fs;
    use tempfile::TempDir;

    fn setup(rows: usize) -> (TempDir, ServiceConfig) {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("diamonds.csv");
        fs::write(&data, to_csv(&synthetic_rows(rows, 21))).unwrap();

        let config = ServiceConfig {
            artifact_dir: dir.path().join("models").join("saved_model"),
            db_path: dir.path().join("instance").join("app_db.sqlite"),
            history_path: Some(dir.path().join("model_history.json")),
            default_dataset: data,
            tuning_trials: 1,
            ..ServiceConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn test_train_and_save_linear_regression() {
        let (_dir, config) = setup(300);

        let record = train_new_model(&config.default_dataset, "linear", &config).unwrap();

        assert_eq!(record.name, "linear_regression");
        assert_eq!(record.version, 1);
        assert_eq!(record.training_dataset, "diamonds");
        assert!(record.metrics[metrics::R2] > 0.8);

        let second = train_new_model(&config.default_dataset, "LinearRegression", &config).unwrap();
        assert_eq!(second.version, 2);

        let registry = config.open_registry().unwrap();
        assert!(registry.load("linear_regression", None).is_ok());
        assert_eq!(registry.history_log().unwrap().entries().unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_model_fails_before_loading_data() {
        let (_dir, config) = setup(50);
        let err = train_new_model(Path::new("/nonexistent.csv"), "svm", &config).unwrap_err();
        assert!(matches!(err, TrainingError::Model(ModelError::UnsupportedModel(_))));
    }

    #[test]
    fn test_missing_dataset_is_reported() {
        let (dir, config) = setup(50);
        let err =
            train_new_model(&dir.path().join("absent.csv"), "linear", &config).unwrap_err();
        assert!(matches!(err, TrainingError::Dataset(_)));
    }

    #[test]
    fn test_too_small_dataset_is_rejected() {
        let (_dir, config) = setup(5);
        let err = train_new_model(&config.default_dataset, "linear", &config).unwrap_err();
        assert!(matches!(err, TrainingError::Dataset(_)));
        let registry = config.open_registry().unwrap();
        assert!(matches!(
            registry.record("linear_regression", None),
            Err(RegistryError::NotFound(_))
        ));
    }
}
