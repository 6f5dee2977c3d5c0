//! Categorical feature encoders

use crate::models::{Category, Diamond};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder with categories learned from data.
///
/// Categories per column are sorted lexicographically. With `drop_first`
/// the first category of each column is the all-zero baseline. Labels not
/// seen while fitting also encode as all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<Vec<String>>,
    drop_first: bool,
}

impl OneHotEncoder {
    /// Learn categories from column-major labels
    pub fn fit<S: AsRef<str>>(columns: &[Vec<S>], drop_first: bool) -> Self {
        let categories = columns
            .iter()
            .map(|column| {
                column
                    .iter()
                    .map(|label| label.as_ref().to_string())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
            .collect();
        Self {
            categories,
            drop_first,
        }
    }

    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Number of output columns
    pub fn n_features_out(&self) -> usize {
        self.categories
            .iter()
            .map(|c| c.len().saturating_sub(usize::from(self.drop_first)))
            .sum()
    }

    /// Encode one row of labels, one label per fitted column
    pub fn transform_row<S: AsRef<str>>(&self, labels: &[S]) -> Vec<f64> {
        let skip = usize::from(self.drop_first);
        let mut encoded = Vec::with_capacity(self.n_features_out());
        for (categories, label) in self.categories.iter().zip(labels) {
            for category in categories.iter().skip(skip) {
                encoded.push(if category == label.as_ref() { 1.0 } else { 0.0 });
            }
        }
        encoded
    }
}

/// All nine features with grades replaced by their ordinal position
pub fn ordinal_features(d: &Diamond) -> [f64; 9] {
    [
        d.carat,
        d.cut.ordinal() as f64,
        d.color.ordinal() as f64,
        d.clarity.ordinal() as f64,
        d.depth,
        d.table,
        d.x,
        d.y,
        d.z,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Clarity, Color, Cut};

    fn encoder() -> OneHotEncoder {
        OneHotEncoder::fit(
            &[vec!["Ideal", "Fair", "Premium", "Ideal"], vec!["E", "D", "E", "J"]],
            true,
        )
    }

    #[test]
    fn test_categories_are_sorted_and_unique() {
        let enc = encoder();
        assert_eq!(enc.categories()[0], vec!["Fair", "Ideal", "Premium"]);
        assert_eq!(enc.categories()[1], vec!["D", "E", "J"]);
        assert_eq!(enc.n_features_out(), 4);
    }

    #[test]
    fn test_drop_first_baseline_is_all_zero() {
        let enc = encoder();
        assert_eq!(enc.transform_row(&["Fair", "D"]), vec![0.0, 0.0, 0.0, 0.0]);
        assert_eq!(enc.transform_row(&["Premium", "E"]), vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unseen_category_is_ignored() {
        let enc = encoder();
        assert_eq!(enc.transform_row(&["Good", "G"]), vec![0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_without_drop_first() {
        let enc = OneHotEncoder::fit(&[vec!["a", "b"]], false);
        assert_eq!(enc.n_features_out(), 2);
        assert_eq!(enc.transform_row(&["b"]), vec![0.0, 1.0]);
    }

    #[test]
    fn test_ordinal_features() {
        let d = Diamond {
            carat: 0.5,
            cut: Cut::Ideal,
            color: Color::E,
            clarity: Clarity::VS1,
            depth: 61.5,
            table: 55.0,
            x: 5.1,
            y: 5.2,
            z: 3.2,
        };
        assert_eq!(
            ordinal_features(&d),
            [0.5, 3.0, 1.0, 3.0, 61.5, 55.0, 5.1, 5.2, 3.2]
        );
    }
}
