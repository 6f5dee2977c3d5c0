//! Gradient-boosted regression trees with ordinal-encoded grades

use super::encoding::ordinal_features;
use super::metrics::mean_absolute_error;
use super::split::{train_test_split, SplitOptions};
use super::tuning::{BoostingParams, HyperparameterSearch, RandomSearch, TuningOptions};
use super::{Metrics, SupervisedModel};
use crate::error::ModelError;
use crate::models::Diamond;
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

pub const MODEL_NAME: &str = "gradient_boosting";

const MODEL_DESCRIPTION: &str =
    "Predicts diamond prices from all nine characteristics with gradient-boosted regression trees";

/// Number of features produced by [`ordinal_features`]
const NUM_FEATURES: usize = 9;

/// Held-out share and seed of the internal validation split used by the search
const VALIDATION_SIZE: f64 = 0.2;
const VALIDATION_SEED: u64 = 42;

/// Boosted-tree variant of the model contract
#[derive(Serialize, Deserialize)]
pub struct GradientBoostingDiamond {
    estimator: Option<GBDT>,
    params: Option<BoostingParams>,
    tuning: TuningOptions,
    metrics: Metrics,
}

impl fmt::Debug for GradientBoostingDiamond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradientBoostingDiamond")
            .field("fitted", &self.estimator.is_some())
            .field("params", &self.params)
            .field("tuning", &self.tuning)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl GradientBoostingDiamond {
    pub fn new(tuning: TuningOptions) -> Self {
        Self {
            estimator: None,
            params: None,
            tuning,
            metrics: Metrics::new(),
        }
    }

    /// Parameters selected by the last search
    pub fn params(&self) -> Option<&BoostingParams> {
        self.params.as_ref()
    }

    fn train(x: &Array2<f64>, y: &Array1<f64>, params: &BoostingParams) -> GBDT {
        let mut cfg = Config::new();
        cfg.set_feature_size(x.ncols());
        cfg.set_max_depth(params.max_depth);
        cfg.set_min_leaf_size(params.min_leaf_size);
        cfg.set_iterations(params.iterations);
        cfg.set_shrinkage(params.shrinkage as f32);
        cfg.set_feature_sample_ratio(params.feature_sample_ratio);
        cfg.set_data_sample_ratio(params.data_sample_ratio);
        cfg.set_loss("SquaredError");
        cfg.set_debug(false);
        cfg.set_training_optimization_level(2);

        let mut data: DataVec = x
            .rows()
            .into_iter()
            .zip(y.iter())
            .map(|(row, label)| Data::new_training_data(to_f32(row), 1.0, *label as f32, None))
            .collect();

        let mut model = GBDT::new(&cfg);
        model.fit(&mut data);
        model
    }

    fn infer(model: &GBDT, x: &Array2<f64>) -> Array1<f64> {
        let data: DataVec = x
            .rows()
            .into_iter()
            .map(|row| Data::new_test_data(to_f32(row), None))
            .collect();
        model.predict(&data).into_iter().map(f64::from).collect()
    }
}

fn to_f32(row: ArrayView1<'_, f64>) -> Vec<f32> {
    row.iter().map(|v| *v as f32).collect()
}

impl SupervisedModel for GradientBoostingDiamond {
    fn model_name(&self) -> &'static str {
        MODEL_NAME
    }

    fn model_description(&self) -> &'static str {
        MODEL_DESCRIPTION
    }

    fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn set_metrics(&mut self, metrics: Metrics) {
        self.metrics = metrics;
    }

    fn is_fitted(&self) -> bool {
        self.estimator.is_some()
    }

    fn input_preprocessing(&mut self, x: &[Diamond]) -> Array2<f64> {
        Array2::from_shape_fn((x.len(), NUM_FEATURES), |(i, j)| ordinal_features(&x[i])[j])
    }

    fn target_preprocessing(&self, y: &Array1<f64>) -> Array1<f64> {
        y.clone()
    }

    /// Search parameters on an internal validation split, then refit on
    /// all of `x` with the winner.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        let validation =
            train_test_split(x, y, SplitOptions::new(VALIDATION_SIZE, VALIDATION_SEED))?;

        let search = RandomSearch::new(self.tuning.clone());
        let outcome = search.search(&mut |params: &BoostingParams| {
            let model = Self::train(&validation.x_train, &validation.y_train, params);
            let predicted = Self::infer(&model, &validation.x_test);
            Ok(mean_absolute_error(&validation.y_test, &predicted))
        })?;

        info!(
            model = MODEL_NAME,
            validation_mae = outcome.best_score,
            trials = outcome.trials_run,
            "Refitting with best parameters"
        );

        self.estimator = Some(Self::train(x, y, &outcome.best));
        self.params = Some(outcome.best);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let model = self
            .estimator
            .as_ref()
            .ok_or_else(|| ModelError::NotFitted(MODEL_NAME.to_string()))?;

        if x.ncols() != NUM_FEATURES {
            return Err(ModelError::ShapeMismatch(format!(
                "expected {} features, got {}",
                NUM_FEATURES,
                x.ncols()
            )));
        }

        Ok(Self::infer(model, x))
    }

    fn postprocessing(&self, y: &Array1<f64>) -> Array1<f64> {
        y.clone()
    }
}
