//! Seeded train/test splitting

use crate::error::ModelError;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Proportion of rows held out and the seed used to shuffle them.
///
/// No `Default`; callers always pass a seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitOptions {
    pub test_size: f64,
    pub seed: u64,
}

impl SplitOptions {
    pub fn new(test_size: f64, seed: u64) -> Self {
        Self { test_size, seed }
    }
}

/// Result of a train/test split
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Shuffle rows with the given seed and hold out `ceil(n * test_size)` of them
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    options: SplitOptions,
) -> Result<Split, ModelError> {
    let n = x.nrows();
    if n != y.len() {
        return Err(ModelError::ShapeMismatch(format!(
            "{} feature rows but {} targets",
            n,
            y.len()
        )));
    }
    if !(options.test_size > 0.0 && options.test_size < 1.0) {
        return Err(ModelError::InvalidSplit(format!(
            "test_size must be in (0, 1), got {}",
            options.test_size
        )));
    }

    let n_test = (n as f64 * options.test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ModelError::InvalidSplit(format!(
            "{} rows cannot be split with test_size {}",
            n, options.test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(options.seed));
    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok(Split {
        x_train: x.select(Axis(0), train_idx),
        x_test: x.select(Axis(0), test_idx),
        y_train: y.select(Axis(0), train_idx),
        y_test: y.select(Axis(0), test_idx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((10, 2), |(i, j)| (i * 10 + j) as f64);
        let y = Array1::from_iter((0..10).map(|i| i as f64));
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = sample();
        let split = train_test_split(&x, &y, SplitOptions::new(0.2, 7)).unwrap();
        assert_eq!(split.x_train.nrows(), 8);
        assert_eq!(split.x_test.nrows(), 2);
        assert_eq!(split.y_train.len(), 8);
        assert_eq!(split.y_test.len(), 2);
    }

    #[test]
    fn test_split_keeps_rows_aligned() {
        let (x, y) = sample();
        let split = train_test_split(&x, &y, SplitOptions::new(0.3, 11)).unwrap();
        for (row, target) in split.x_train.rows().into_iter().zip(split.y_train.iter()) {
            assert_eq!(row[0], target * 10.0);
        }
        for (row, target) in split.x_test.rows().into_iter().zip(split.y_test.iter()) {
            assert_eq!(row[0], target * 10.0);
        }
    }

    #[test]
    fn test_same_seed_same_split() {
        let (x, y) = sample();
        let a = train_test_split(&x, &y, SplitOptions::new(0.2, 42)).unwrap();
        let b = train_test_split(&x, &y, SplitOptions::new(0.2, 42)).unwrap();
        assert_eq!(a.y_test, b.y_test);
        assert_eq!(a.y_train, b.y_train);
    }

    #[test]
    fn test_rejects_out_of_range_test_size() {
        let (x, y) = sample();
        assert!(matches!(
            train_test_split(&x, &y, SplitOptions::new(1.0, 1)),
            Err(ModelError::InvalidSplit(_))
        ));
        assert!(matches!(
            train_test_split(&x, &y, SplitOptions::new(0.0, 1)),
            Err(ModelError::InvalidSplit(_))
        ));
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let x = Array2::<f64>::zeros((3, 1));
        let y = array![1.0, 2.0];
        assert!(matches!(
            train_test_split(&x, &y, SplitOptions::new(0.2, 1)),
            Err(ModelError::ShapeMismatch(_))
        ));
    }
}
