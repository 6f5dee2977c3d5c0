//! Model contract shared by every regression variant
//!
//! A variant supplies the model-specific steps (preprocessing, fitting,
//! prediction, postprocessing); the training and execution pipelines are
//! provided here once and are identical for all variants.

mod boosting;
mod encoding;
mod factory;
mod linear;
pub mod metrics;
mod split;
pub mod tuning;

pub use boosting::GradientBoostingDiamond;
pub use encoding::{ordinal_features, OneHotEncoder};
pub use factory::{get_model, DiamondModel, ModelKind};
pub use linear::LinearRegressionDiamond;
pub use metrics::Metrics;
pub use split::{train_test_split, Split, SplitOptions};
pub use tuning::{
    BoostingParams, HyperparameterSearch, RandomSearch, SearchOutcome, SearchSpace,
    TuningOptions, MAX_TRIALS,
};

use crate::error::ModelError;
use crate::models::Diamond;
use ndarray::{Array1, Array2};
use tracing::debug;

/// Uniform train/evaluate/predict lifecycle for a regression variant
pub trait SupervisedModel: Send {
    /// Canonical name the registry stores this variant under
    fn model_name(&self) -> &'static str;

    fn model_description(&self) -> &'static str;

    /// Metrics from the last training run (empty until trained)
    fn metrics(&self) -> &Metrics;

    fn set_metrics(&mut self, metrics: Metrics);

    /// True once an estimator has been fitted
    fn is_fitted(&self) -> bool;

    /// Turn raw records into a feature matrix.
    ///
    /// Variants with a learned encoder fit it on the first call only and
    /// reuse it afterwards; unseen categories never cause an error.
    fn input_preprocessing(&mut self, x: &[Diamond]) -> Array2<f64>;

    /// Monotonic target transform applied before fitting
    fn target_preprocessing(&self, y: &Array1<f64>) -> Array1<f64>;

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError>;

    /// Inverse of [`SupervisedModel::target_preprocessing`]
    fn postprocessing(&self, y: &Array1<f64>) -> Array1<f64>;

    /// Compute R² and MAE.
    ///
    /// Both arguments must already be postprocessed (original price scale).
    fn evaluate(&self, y_predicted: &Array1<f64>, y_real: &Array1<f64>) -> Metrics {
        metrics::regression_metrics(y_predicted, y_real)
    }

    /// Preprocess, split, fit, predict on the held-out split, postprocess
    /// both sides, evaluate and store the metrics.
    fn train_pipeline(
        &mut self,
        x: &[Diamond],
        y: &[f64],
        split: SplitOptions,
    ) -> Result<Metrics, ModelError> {
        if x.len() != y.len() {
            return Err(ModelError::ShapeMismatch(format!(
                "{} feature rows but {} targets",
                x.len(),
                y.len()
            )));
        }

        let features = self.input_preprocessing(x);
        let target = self.target_preprocessing(&Array1::from(y.to_vec()));
        let split = train_test_split(&features, &target, split)?;

        debug!(
            model = self.model_name(),
            train_rows = split.y_train.len(),
            test_rows = split.y_test.len(),
            features = features.ncols(),
            "Fitting model"
        );
        self.fit(&split.x_train, &split.y_train)?;

        let y_pred = self.postprocessing(&self.predict(&split.x_test)?);
        let y_test = self.postprocessing(&split.y_test);
        let metrics = self.evaluate(&y_pred, &y_test);
        self.set_metrics(metrics.clone());

        Ok(metrics)
    }

    /// Preprocess, predict and postprocess new records
    fn execution_pipeline(&mut self, x: &[Diamond]) -> Result<Array1<f64>, ModelError> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted(self.model_name().to_string()));
        }
        let features = self.input_preprocessing(x);
        let y_pred = self.predict(&features)?;
        Ok(self.postprocessing(&y_pred))
    }
}
