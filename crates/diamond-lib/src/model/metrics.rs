//! Regression metrics on the original price scale

use ndarray::Array1;
use std::collections::BTreeMap;

/// Metric name to value, e.g. `{"mae": 412.3, "r2": 0.97}`
pub type Metrics = BTreeMap<String, f64>;

pub const R2: &str = "r2";
pub const MAE: &str = "mae";

/// Coefficient of determination.
///
/// A constant target yields 1.0 for a perfect prediction and 0.0 otherwise.
pub fn r2_score(y_real: &Array1<f64>, y_predicted: &Array1<f64>) -> f64 {
    if y_real.is_empty() {
        return f64::NAN;
    }
    let mean = y_real.mean().unwrap_or_default();
    let ss_res: f64 = y_real
        .iter()
        .zip(y_predicted.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_real.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn mean_absolute_error(y_real: &Array1<f64>, y_predicted: &Array1<f64>) -> f64 {
    if y_real.is_empty() {
        return f64::NAN;
    }
    let total: f64 = y_real
        .iter()
        .zip(y_predicted.iter())
        .map(|(t, p)| (t - p).abs())
        .sum();
    total / y_real.len() as f64
}

/// R² and MAE keyed by [`R2`] and [`MAE`]
pub fn regression_metrics(y_predicted: &Array1<f64>, y_real: &Array1<f64>) -> Metrics {
    let mut metrics = Metrics::new();
    metrics.insert(R2.to_string(), r2_score(y_real, y_predicted));
    metrics.insert(MAE.to_string(), mean_absolute_error(y_real, y_predicted));
    metrics
}
