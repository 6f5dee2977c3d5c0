//! Core data models for the diamond pricing service

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cut grade of a diamond, in the ordinal order used for tree encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cut {
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Ideal,
    Premium,
}

/// Color grade, D (colorless) through J
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    D,
    E,
    F,
    G,
    H,
    I,
    J,
}

/// Clarity grade, IF (internally flawless) through I1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Clarity {
    IF,
    VVS1,
    VVS2,
    VS1,
    VS2,
    SI1,
    SI2,
    I1,
}

/// Error returned when a categorical label is outside its allowed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {field}, expected one of: {allowed}")]
pub struct UnknownCategory {
    pub field: &'static str,
    pub value: String,
    pub allowed: String,
}

/// Shared behaviour of the three categorical diamond attributes
pub trait Category: Copy + Sized + 'static {
    /// Column name in the dataset and in API payloads
    const FIELD: &'static str;
    /// Every value, in ordinal order
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    /// Position in the ordinal order
    fn ordinal(&self) -> usize {
        Self::ALL
            .iter()
            .position(|c| c.as_str() == self.as_str())
            .unwrap_or_default()
    }

    fn parse_label(value: &str) -> Result<Self, UnknownCategory> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| UnknownCategory {
                field: Self::FIELD,
                value: value.to_string(),
                allowed: Self::ALL
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl Category for Cut {
    const FIELD: &'static str = "cut";
    const ALL: &'static [Self] = &[
        Cut::Fair,
        Cut::Good,
        Cut::VeryGood,
        Cut::Ideal,
        Cut::Premium,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Cut::Fair => "Fair",
            Cut::Good => "Good",
            Cut::VeryGood => "Very Good",
            Cut::Ideal => "Ideal",
            Cut::Premium => "Premium",
        }
    }
}

impl Category for Color {
    const FIELD: &'static str = "color";
    const ALL: &'static [Self] = &[
        Color::D,
        Color::E,
        Color::F,
        Color::G,
        Color::H,
        Color::I,
        Color::J,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Color::D => "D",
            Color::E => "E",
            Color::F => "F",
            Color::G => "G",
            Color::H => "H",
            Color::I => "I",
            Color::J => "J",
        }
    }
}

impl Category for Clarity {
    const FIELD: &'static str = "clarity";
    const ALL: &'static [Self] = &[
        Clarity::IF,
        Clarity::VVS1,
        Clarity::VVS2,
        Clarity::VS1,
        Clarity::VS2,
        Clarity::SI1,
        Clarity::SI2,
        Clarity::I1,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Clarity::IF => "IF",
            Clarity::VVS1 => "VVS1",
            Clarity::VVS2 => "VVS2",
            Clarity::VS1 => "VS1",
            Clarity::VS2 => "VS2",
            Clarity::SI1 => "SI1",
            Clarity::SI2 => "SI2",
            Clarity::I1 => "I1",
        }
    }
}

macro_rules! category_traits {
    ($($ty:ty),*) => {$(
        impl FromStr for $ty {
            type Err = UnknownCategory;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as Category>::parse_label(s)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

category_traits!(Cut, Color, Clarity);

/// Input features describing one diamond
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diamond {
    pub carat: f64,
    pub cut: Cut,
    pub color: Color,
    pub clarity: Clarity,
    pub depth: f64,
    pub table: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Diamond {
    /// True when the three categorical attributes match exactly
    pub fn same_grade(&self, other: &Diamond) -> bool {
        self.cut == other.cut && self.color == other.color && self.clarity == other.clarity
    }
}

/// A dataset row: features plus the price when the target is known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiamondRow {
    pub diamond: Diamond,
    pub price: Option<f64>,
}

impl DiamondRow {
    /// Row values in the canonical dataset column order
    /// (carat, cut, color, clarity, depth, table, price, x, y, z)
    pub fn values(&self) -> Vec<serde_json::Value> {
        let d = &self.diamond;
        vec![
            d.carat.into(),
            d.cut.as_str().into(),
            d.color.as_str().into(),
            d.clarity.as_str().into(),
            d.depth.into(),
            d.table.into(),
            self.price
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            d.x.into(),
            d.y.into(),
            d.z.into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_labels() {
        for cut in Cut::ALL {
            assert_eq!(cut.as_str().parse::<Cut>().unwrap(), *cut);
        }
        assert_eq!("Very Good".parse::<Cut>().unwrap(), Cut::VeryGood);
        assert_eq!("VS1".parse::<Clarity>().unwrap(), Clarity::VS1);
    }

    #[test]
    fn test_unknown_category_lists_allowed_values() {
        let err = "Z".parse::<Color>().unwrap_err();
        assert_eq!(err.field, "color");
        assert!(err.allowed.contains("D, E, F"));
    }

    #[test]
    fn test_ordinals_follow_grading_order() {
        assert_eq!(Cut::Fair.ordinal(), 0);
        assert_eq!(Cut::Premium.ordinal(), 4);
        assert_eq!(Color::J.ordinal(), 6);
        assert_eq!(Clarity::I1.ordinal(), 7);
    }

    #[test]
    fn test_serde_uses_display_labels() {
        let json = serde_json::to_string(&Cut::VeryGood).unwrap();
        assert_eq!(json, "\"Very Good\"");
    }

    #[test]
    fn test_row_values_order() {
        let row = DiamondRow {
            diamond: Diamond {
                carat: 0.5,
                cut: Cut::Ideal,
                color: Color::E,
                clarity: Clarity::VS1,
                depth: 61.5,
                table: 55.0,
                x: 5.1,
                y: 5.1,
                z: 3.2,
            },
            price: Some(1500.0),
        };
        let values = row.values();
        assert_eq!(values.len(), 10);
        assert_eq!(values[1], "Ideal");
        assert_eq!(values[6], 1500.0);
    }
}
