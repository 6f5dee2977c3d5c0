//! Hyperparameter search for the boosted-tree variant
//!
//! The search is opaque to the model contract: it is handed an objective
//! (lower is better) and returns the best parameter set it found within a
//! bounded number of trials.

use crate::error::ModelError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Upper bound on the number of trials any search may run
pub const MAX_TRIALS: usize = 100;

/// Boosted-tree training parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    /// Learning rate applied to every tree
    pub shrinkage: f64,
    /// Number of boosting rounds
    pub iterations: usize,
    pub max_depth: u32,
    pub min_leaf_size: usize,
    /// Fraction of features considered per tree
    pub feature_sample_ratio: f64,
    /// Fraction of rows sampled per tree
    pub data_sample_ratio: f64,
}

/// Ranges sampled by the random search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    /// Sampled log-uniformly
    pub shrinkage: (f64, f64),
    pub iterations: (usize, usize),
    pub max_depth: (u32, u32),
    pub min_leaf_size: (usize, usize),
    pub feature_sample_ratio: Vec<f64>,
    pub data_sample_ratio: Vec<f64>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            shrinkage: (1e-3, 1.0),
            iterations: (100, 1000),
            max_depth: (3, 9),
            min_leaf_size: (1, 10),
            feature_sample_ratio: vec![0.3, 0.4, 0.5, 0.7],
            data_sample_ratio: vec![0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
        }
    }
}

impl SearchSpace {
    fn sample<R: Rng>(&self, rng: &mut R) -> BoostingParams {
        let (lo, hi) = ordered(self.shrinkage.0, self.shrinkage.1);
        let shrinkage = if lo > 0.0 && lo < hi {
            rng.gen_range(lo.ln()..=hi.ln()).exp()
        } else {
            lo
        };

        BoostingParams {
            shrinkage,
            iterations: sample_int(rng, self.iterations),
            max_depth: sample_int(rng, self.max_depth),
            min_leaf_size: sample_int(rng, self.min_leaf_size),
            feature_sample_ratio: self
                .feature_sample_ratio
                .choose(rng)
                .copied()
                .unwrap_or(1.0),
            data_sample_ratio: self.data_sample_ratio.choose(rng).copied().unwrap_or(1.0),
        }
    }
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn sample_int<R, T>(rng: &mut R, range: (T, T)) -> T
where
    R: Rng,
    T: PartialOrd + Copy + rand::distributions::uniform::SampleUniform,
{
    let (lo, hi) = ordered(range.0, range.1);
    rng.gen_range(lo..=hi)
}

/// Search budget, seed and space; persisted with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningOptions {
    pub trials: usize,
    pub seed: u64,
    pub space: SearchSpace,
}

impl TuningOptions {
    pub fn new(trials: usize, seed: u64) -> Self {
        Self {
            trials,
            seed,
            space: SearchSpace::default(),
        }
    }

    pub fn with_space(mut self, space: SearchSpace) -> Self {
        self.space = space;
        self
    }

    /// Trial count clamped to `1..=MAX_TRIALS`
    pub fn effective_trials(&self) -> usize {
        self.trials.clamp(1, MAX_TRIALS)
    }
}

/// Best parameters found by a search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub best: BoostingParams,
    pub best_score: f64,
    pub trials_run: usize,
}

/// Optimizer returning the parameter set that minimises an objective
pub trait HyperparameterSearch {
    fn search(
        &self,
        objective: &mut dyn FnMut(&BoostingParams) -> Result<f64, ModelError>,
    ) -> Result<SearchOutcome, ModelError>;
}

/// Seeded random search
#[derive(Debug, Clone)]
pub struct RandomSearch {
    options: TuningOptions,
}

impl RandomSearch {
    pub fn new(options: TuningOptions) -> Self {
        Self { options }
    }
}

impl HyperparameterSearch for RandomSearch {
    fn search(
        &self,
        objective: &mut dyn FnMut(&BoostingParams) -> Result<f64, ModelError>,
    ) -> Result<SearchOutcome, ModelError> {
        let trials = self.options.effective_trials();
        let mut rng = StdRng::seed_from_u64(self.options.seed);
        let mut best: Option<(BoostingParams, f64)> = None;

        for trial in 0..trials {
            let params = self.options.space.sample(&mut rng);
            let score = objective(&params)?;
            debug!(trial = trial, score = score, params = ?params, "Search trial finished");

            if score.is_nan() {
                continue;
            }
            if best.as_ref().map_or(true, |(_, b)| score < *b) {
                best = Some((params, score));
            }
        }

        let (best, best_score) = best.ok_or_else(|| {
            ModelError::Estimator("hyperparameter search produced no finite score".to_string())
        })?;

        info!(
            trials = trials,
            best_score = best_score,
            params = ?best,
            "Hyperparameter search finished"
        );

        Ok(SearchOutcome {
            best,
            best_score,
            trials_run: trials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trials_are_bounded() {
        assert_eq!(TuningOptions::new(500, 1).effective_trials(), MAX_TRIALS);
        assert_eq!(TuningOptions::new(0, 1).effective_trials(), 1);
        assert_eq!(TuningOptions::new(7, 1).effective_trials(), 7);
    }

    #[test]
    fn test_samples_stay_in_space() {
        let space = SearchSpace::default();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let p = space.sample(&mut rng);
            assert!(p.shrinkage >= 1e-3 - 1e-12 && p.shrinkage <= 1.0 + 1e-12);
            assert!((100..=1000).contains(&p.iterations));
            assert!((3..=9).contains(&p.max_depth));
            assert!((1..=10).contains(&p.min_leaf_size));
            assert!(space.feature_sample_ratio.contains(&p.feature_sample_ratio));
            assert!(space.data_sample_ratio.contains(&p.data_sample_ratio));
        }
    }

    #[test]
    fn test_search_minimises_objective() {
        let search = RandomSearch::new(TuningOptions::new(MAX_TRIALS, 9));
        let mut calls = 0;
        let outcome = search
            .search(&mut |p: &BoostingParams| {
                calls += 1;
                Ok((p.max_depth as f64 - 6.0).abs())
            })
            .unwrap();

        assert_eq!(calls, MAX_TRIALS);
        assert_eq!(outcome.trials_run, MAX_TRIALS);
        assert_eq!(outcome.best.max_depth, 6);
        assert_eq!(outcome.best_score, 0.0);
    }

    #[test]
    fn test_search_is_reproducible() {
        let run = || {
            RandomSearch::new(TuningOptions::new(10, 42))
                .search(&mut |p: &BoostingParams| Ok(p.shrinkage))
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_objective_errors_propagate() {
        let search = RandomSearch::new(TuningOptions::new(5, 1));
        let result = search.search(&mut |_: &BoostingParams| {
            Err(ModelError::Estimator("boom".to_string()))
        });
        assert!(result.is_err());
    }
}
