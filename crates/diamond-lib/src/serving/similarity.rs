//! Similar-diamond lookup over the canonical dataset

use crate::models::{Diamond, DiamondRow};

/// Rows with the same cut, color and clarity as `query`, closest carat
/// first, at most `count` of them.
///
/// Ties keep dataset order.
pub fn find_similar<'a>(rows: &'a [DiamondRow], query: &Diamond, count: usize) -> Vec<&'a DiamondRow> {
    let mut matches: Vec<(f64, &DiamondRow)> = rows
        .iter()
        .filter(|row| row.diamond.same_grade(query))
        .map(|row| ((row.diamond.carat - query.carat).abs(), row))
        .collect();

    matches.sort_by(|a, b| a.0.total_cmp(&b.0));
    matches.into_iter().take(count).map(|(_, row)| row).collect()
}
