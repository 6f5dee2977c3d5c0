//! Synthetic data shared by unit tests

use crate::models::{Category, Clarity, Color, Cut, Diamond, DiamondRow};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;

/// The well-formed record used throughout the API tests
pub fn sample_diamond() -> Diamond {
    Diamond {
        carat: 0.5,
        cut: Cut::Ideal,
        color: Color::E,
        clarity: Clarity::VS1,
        depth: 61.5,
        table: 55.0,
        x: 5.1,
        y: 5.1,
        z: 3.2,
    }
}

/// Diamonds whose price is `5000 * carat` plus uniform noise in ±250
pub fn synthetic_diamonds(n: usize, seed: u64) -> (Vec<Diamond>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut diamonds = Vec::with_capacity(n);
    let mut prices = Vec::with_capacity(n);

    for _ in 0..n {
        let carat: f64 = rng.gen_range(0.3..2.0);
        let x = 6.4 * carat.cbrt();
        let y = x + rng.gen_range(-0.05..0.05);
        diamonds.push(Diamond {
            carat,
            cut: *Cut::ALL.choose(&mut rng).unwrap(),
            color: *Color::ALL.choose(&mut rng).unwrap(),
            clarity: *Clarity::ALL.choose(&mut rng).unwrap(),
            depth: rng.gen_range(58.0..64.0),
            table: rng.gen_range(53.0..60.0),
            x,
            y,
            z: 0.62 * x,
        });
        prices.push(5000.0 * carat + rng.gen_range(-250.0..250.0));
    }

    (diamonds, prices)
}

pub fn synthetic_rows(n: usize, seed: u64) -> Vec<DiamondRow> {
    let (diamonds, prices) = synthetic_diamonds(n, seed);
    diamonds
        .into_iter()
        .zip(prices)
        .map(|(diamond, price)| DiamondRow {
            diamond,
            price: Some(price),
        })
        .collect()
}

/// Render rows as a dataset CSV with the canonical header
pub fn to_csv(rows: &[DiamondRow]) -> String {
    let mut out = String::from("carat,cut,color,clarity,depth,table,price,x,y,z\n");
    for row in rows {
        let d = &row.diamond;
        let price = row.price.map(|p| p.to_string()).unwrap_or_default();
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{}",
            d.carat, d.cut, d.color, d.clarity, d.depth, d.table, price, d.x, d.y, d.z
        );
    }
    out
}
