//! Linear regression on log-price

use super::encoding::OneHotEncoder;
use super::{Metrics, SupervisedModel};
use crate::error::ModelError;
use crate::models::{Category, Diamond};
use linfa::traits::Fit;
use linfa::DatasetBase;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

pub const MODEL_NAME: &str = "linear_regression";

const MODEL_DESCRIPTION: &str =
    "Predicts diamond prices from carat, length and one-hot encoded grades with ordinary least squares on log-price";

/// Numeric columns kept by this variant; depth, table, y and z are dropped
const NUMERIC_COLUMNS: usize = 2;

/// Fitted intercept and weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Coefficients {
    intercept: f64,
    weights: Vec<f64>,
}

/// Linear-regression variant of the model contract
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegressionDiamond {
    encoder: Option<OneHotEncoder>,
    coefficients: Option<Coefficients>,
    metrics: Metrics,
}

impl LinearRegressionDiamond {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted encoder, if preprocessing has run
    pub fn encoder(&self) -> Option<&OneHotEncoder> {
        self.encoder.as_ref()
    }

    fn grade_labels(d: &Diamond) -> [&'static str; 3] {
        [d.cut.as_str(), d.color.as_str(), d.clarity.as_str()]
    }
}

impl SupervisedModel for LinearRegressionDiamond {
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
        self.coefficients.is_some()
    }

    fn input_preprocessing(&mut self, x: &[Diamond]) -> Array2<f64> {
        let encoder = self.encoder.get_or_insert_with(|| {
            let mut columns = vec![Vec::with_capacity(x.len()); 3];
            for d in x {
                for (column, label) in columns.iter_mut().zip(Self::grade_labels(d)) {
                    column.push(label);
                }
            }
            OneHotEncoder::fit(&columns, true)
        });

        let width = NUMERIC_COLUMNS + encoder.n_features_out();
        let mut data = Vec::with_capacity(x.len() * width);
        for d in x {
            data.push(d.carat);
            data.push(d.x);
            data.extend(encoder.transform_row(&Self::grade_labels(d)));
        }

        // Row-major with a fixed width per row
        Array2::from_shape_vec((x.len(), width), data).unwrap_or_else(|_| Array2::zeros((0, width)))
    }

    fn target_preprocessing(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(f64::ln)
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        let dataset = DatasetBase::new(x.to_owned(), y.to_owned());
        let fitted = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| ModelError::Estimator(e.to_string()))?;

        self.coefficients = Some(Coefficients {
            intercept: fitted.intercept(),
            weights: fitted.params().to_vec(),
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or_else(|| ModelError::NotFitted(MODEL_NAME.to_string()))?;

        if x.ncols() != coefficients.weights.len() {
            return Err(ModelError::ShapeMismatch(format!(
                "expected {} features, got {}",
                coefficients.weights.len(),
                x.ncols()
            )));
        }

        let weights = Array1::from(coefficients.weights.clone());
        Ok(x.dot(&weights) + coefficients.intercept)
    }

    fn postprocessing(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(f64::exp)
    }
}
