//! Variant factory
//!
//! Maps a model-name string (canonical name or alias) to a fresh variant
//! instance behind the closed [`DiamondModel`] enum.

use super::boosting::{self, GradientBoostingDiamond};
use super::linear::{self, LinearRegressionDiamond};
use super::tuning::TuningOptions;
use super::{Metrics, SupervisedModel};
use crate::error::ModelError;
use crate::models::Diamond;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Known model variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    LinearRegression,
    GradientBoosting,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::LinearRegression, ModelKind::GradientBoosting];

    /// Name records are stored under
    pub fn canonical_name(&self) -> &'static str {
        match self {
            ModelKind::LinearRegression => linear::MODEL_NAME,
            ModelKind::GradientBoosting => boosting::MODEL_NAME,
        }
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear_regression" | "LinearRegression" | "linear" => Ok(ModelKind::LinearRegression),
            "gradient_boosting" | "xgboost" | "XgBoost" => Ok(ModelKind::GradientBoosting),
            other => Err(ModelError::UnsupportedModel(other.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// A model instance of any supported variant
#[derive(Debug, Serialize, Deserialize)]
pub enum DiamondModel {
    LinearRegression(LinearRegressionDiamond),
    GradientBoosting(Box<GradientBoostingDiamond>),
}

impl DiamondModel {
    pub fn new(kind: ModelKind, tuning: TuningOptions) -> Self {
        match kind {
            ModelKind::LinearRegression => {
                DiamondModel::LinearRegression(LinearRegressionDiamond::new())
            }
            ModelKind::GradientBoosting => {
                DiamondModel::GradientBoosting(Box::new(GradientBoostingDiamond::new(tuning)))
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            DiamondModel::LinearRegression(_) => ModelKind::LinearRegression,
            DiamondModel::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    fn inner(&self) -> &dyn SupervisedModel {
        match self {
            DiamondModel::LinearRegression(m) => m,
            DiamondModel::GradientBoosting(m) => m.as_ref(),
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SupervisedModel {
        match self {
            DiamondModel::LinearRegression(m) => m,
            DiamondModel::GradientBoosting(m) => m.as_mut(),
        }
    }
}

/// Build a fresh, unfitted variant from a name or alias.
///
/// `tuning` only affects variants with a hyperparameter search.
pub fn get_model(name: &str, tuning: TuningOptions) -> Result<DiamondModel, ModelError> {
    let kind = name.parse::<ModelKind>()?;
    Ok(DiamondModel::new(kind, tuning))
}

// Only the variant-specific steps are forwarded; train_pipeline and
// execution_pipeline keep their provided definitions.
impl SupervisedModel for DiamondModel {
    fn model_name(&self) -> &'static str {
        self.inner().model_name()
    }

    fn model_description(&self) -> &'static str {
        self.inner().model_description()
    }

    fn metrics(&self) -> &Metrics {
        self.inner().metrics()
    }

    fn set_metrics(&mut self, metrics: Metrics) {
        self.inner_mut().set_metrics(metrics)
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }

    fn input_preprocessing(&mut self, x: &[Diamond]) -> Array2<f64> {
        self.inner_mut().input_preprocessing(x)
    }

    fn target_preprocessing(&self, y: &Array1<f64>) -> Array1<f64> {
        self.inner().target_preprocessing(y)
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        self.inner().predict(x)
    }

    fn postprocessing(&self, y: &Array1<f64>) -> Array1<f64> {
        self.inner().postprocessing(y)
    }

    fn evaluate(&self, y_predicted: &Array1<f64>, y_real: &Array1<f64>) -> Metrics {
        self.inner().evaluate(y_predicted, y_real)
    }
}
