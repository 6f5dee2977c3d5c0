use super::*;
use crate::model::{get_model, SearchSpace, SplitOptions, TuningOptions};
use crate::test_support::{sample_diamond, synthetic_diamonds};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn registry(dir: &TempDir) -> ModelRegistry {
    ModelRegistry::open(
        dir.path().join("instance").join("app_db.sqlite"),
        dir.path().join("models").join("saved_model"),
    )
    .unwrap()
}

fn trained(name: &str) -> DiamondModel {
    let tuning = TuningOptions::new(1, 1).with_space(SearchSpace {
        shrinkage: (0.3, 0.3),
        iterations: (5, 10),
        max_depth: (3, 3),
        min_leaf_size: (1, 1),
        feature_sample_ratio: vec![1.0],
        data_sample_ratio: vec![1.0],
    });
    let (x, y) = synthetic_diamonds(60, 8);
    let mut model = get_model(name, tuning).unwrap();
    model
        .train_pipeline(&x, &y, SplitOptions::new(0.2, 42))
        .unwrap();
    model
}

#[test]
fn test_versions_are_sequential_per_name() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir);
    let model = trained("linear");

    for expected in 1..=4 {
        assert_eq!(registry.next_version("linear_regression").unwrap(), expected);
        let record = registry.save(&model, "diamonds").unwrap();
        assert_eq!(record.version, expected);
    }

    // Other names keep their own counter
    assert_eq!(registry.next_version("gradient_boosting").unwrap(), 1);
}

#[test]
fn test_latest_resolves_to_highest_version() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir);
    let model = trained("linear");

    let first = registry.save(&model, "diamonds").unwrap();
    let second = registry.save(&model, "diamonds").unwrap();

    assert_eq!(
        registry.resolve_path("linear_regression", None).unwrap(),
        PathBuf::from(&second.artifact_path)
    );
    assert_eq!(
        registry.resolve_path("linear_regression", Some(1)).unwrap(),
        PathBuf::from(&first.artifact_path)
    );
    assert_ne!(first.artifact_path, second.artifact_path);
}

#[test]
fn test_saved_record_describes_the_model() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir);
    let model = trained("linear_regression");

    let record = registry.save(&model, "diamonds").unwrap();

    assert_eq!(record.name, "linear_regression");
    assert_eq!(record.training_dataset, "diamonds");
    assert_eq!(&record.metrics, model.metrics());
    assert!(!record.description.is_empty());
    assert!(Path::new(&record.artifact_path).exists());
    assert_eq!(registry.record("linear_regression", None).unwrap(), record);
}

#[test]
fn test_load_round_trips_a_saved_model() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir);
    let mut model = trained("gradient_boosting");
    registry.save(&model, "diamonds").unwrap();

    let mut loaded = registry.load("gradient_boosting", Some(1)).unwrap();

    let query = [sample_diamond()];
    assert_eq!(
        loaded.execution_pipeline(&query).unwrap(),
        model.execution_pipeline(&query).unwrap()
    );
    assert_eq!(loaded.metrics(), model.metrics());
}

#[test]
fn test_missing_model_is_not_found() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir);
    registry.save(&trained("linear"), "diamonds").unwrap();

    for (name, version) in [
        ("linear_regression", Some(7)),
        ("gradient_boosting", None),
        ("unknown", Some(1)),
    ] {
        let err = registry.load(name, version).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)), "{name}: {err}");
    }
}

#[test]
fn test_corrupt_artifact_is_not_found() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir);
    let record = registry.save(&trained("linear"), "diamonds").unwrap();
    fs::write(&record.artifact_path, b"garbage").unwrap();

    let err = registry.load("linear_regression", None).unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
}

#[test]
fn test_failed_artifact_write_leaves_no_record() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir);

    // A directory at the artifact path makes the final rename fail
    let blocker = artifact::artifact_path(registry.artifact_dir(), "linear_regression", 1);
    fs::create_dir_all(blocker.join("occupied")).unwrap();

    let result = registry.save(&trained("linear"), "diamonds");

    assert!(matches!(result, Err(RegistryError::Io { .. })));
    assert!(registry.list(None).unwrap().is_empty());
    assert_eq!(registry.next_version("linear_regression").unwrap(), 1);
    assert!(!blocker.with_extension("tmp").exists());
}

#[test]
fn test_unfitted_model_is_rejected() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir);
    let model = get_model("linear", TuningOptions::new(1, 1)).unwrap();

    let err = registry.save(&model, "diamonds").unwrap_err();
    assert!(matches!(err, RegistryError::Model(ModelError::NotFitted(_))));
    assert!(registry.list(None).unwrap().is_empty());
}

#[test]
fn test_purge_keeps_records_and_reports_dangling() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir);
    let model = trained("linear");
    registry.save(&model, "diamonds").unwrap();
    registry.save(&model, "diamonds").unwrap();

    assert_eq!(registry.purge_all_artifacts().unwrap(), 2);

    assert_eq!(registry.list(None).unwrap().len(), 2);
    assert_eq!(registry.dangling_records().unwrap().len(), 2);
    assert!(matches!(
        registry.load("linear_regression", None),
        Err(RegistryError::NotFound(_))
    ));

    // Versions are never reused after a purge
    assert_eq!(registry.save(&model, "diamonds").unwrap().version, 3);
    assert_eq!(registry.dangling_records().unwrap().len(), 2);
}

#[test]
fn test_list_orders_by_name_then_version() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir);
    let linear = trained("linear");
    let boosted = trained("xgboost");
    registry.save(&linear, "a").unwrap();
    registry.save(&boosted, "b").unwrap();
    registry.save(&linear, "c").unwrap();

    let all: Vec<(String, u32)> = registry
        .list(None)
        .unwrap()
        .into_iter()
        .map(|r| (r.name, r.version))
        .collect();
    assert_eq!(
        all,
        vec![
            ("gradient_boosting".to_string(), 1),
            ("linear_regression".to_string(), 1),
            ("linear_regression".to_string(), 2),
        ]
    );
    assert_eq!(registry.list(Some("linear_regression")).unwrap().len(), 2);
}

#[test]
fn test_non_finite_metrics_do_not_break_reads() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir);
    registry.save(&trained("linear"), "diamonds").unwrap();

    let mut metrics = Metrics::new();
    metrics.insert("mae".to_string(), f64::INFINITY);
    metrics.insert("r2".to_string(), 0.5);
    let stored = serde_json::to_string(&metrics).unwrap();
    assert!(stored.contains("null"));
    store::open(registry.db_path())
        .unwrap()
        .execute("UPDATE models_history SET metrics = ?1", [&stored])
        .unwrap();

    let records = registry.list(None).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].metrics["mae"].is_nan());
    assert_eq!(records[0].metrics["r2"], 0.5);
    assert!(registry.dangling_records().unwrap().is_empty());
    assert!(registry.load("linear_regression", None).is_ok());
}

#[test]
fn test_history_log_is_appended() {
    let dir = TempDir::new().unwrap();
    let registry = registry(&dir).with_history_log(dir.path().join("model_history.json"));
    let model = trained("linear");
    registry.save(&model, "diamonds").unwrap();
    registry.save(&model, "diamonds").unwrap();

    let entries = registry.history_log().unwrap().entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].version, 2);
    assert_eq!(entries[1].dataset, "diamonds");
}

#[test]
fn test_broken_history_log_does_not_fail_save() {
    let dir = TempDir::new().unwrap();
    let history = dir.path().join("model_history.json");
    fs::write(&history, "{not json").unwrap();
    let registry = registry(&dir).with_history_log(&history);

    assert!(registry.save(&trained("linear"), "diamonds").is_ok());
    assert_eq!(registry.list(None).unwrap().len(), 1);
}

#[test]
fn test_concurrent_saves_never_share_a_version() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("app_db.sqlite");
    let artifacts = dir.path().join("models");
    let model = Arc::new(trained("linear"));

    // Two registries on one database behave like two processes
    let registries = [
        Arc::new(ModelRegistry::open(&db, &artifacts).unwrap()),
        Arc::new(ModelRegistry::open(&db, &artifacts).unwrap()),
    ];

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registries[i % 2]);
            let model = Arc::clone(&model);
            thread::spawn(move || registry.save(&model, "diamonds"))
        })
        .collect();

    let mut versions = Vec::new();
    for handle in handles {
        match handle.join().unwrap() {
            Ok(record) => versions.push(record.version),
            Err(e) => assert!(e.is_retryable(), "unexpected error: {e}"),
        }
    }

    let mut unique = versions.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), versions.len());
    assert_eq!(registries[0].list(None).unwrap().len(), versions.len());
    assert!(!versions.is_empty());
}
