use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(
    Copy, Clone, Default, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub enum SiPrefix {
    Pico,
    Nano,
    Micro,
    Milli,
    #[default]
    None,
}

impl SiPrefix {
    /// The power of ten represented by this prefix.
    pub fn exponent(&self) -> i32 {
        match self {
            SiPrefix::Pico => -12,
            SiPrefix::Nano => -9,
            SiPrefix::Micro => -6,
            SiPrefix::Milli => -3,
            SiPrefix::None => 0,
        }
    }

    pub fn multiplier(&self) -> f64 {
        10f64.powi(self.exponent())
    }

    /// The factor converting a value in `self` units to `other` units.
    ///
    /// Computed from integer exponents so that, for example, micro to nano is exactly 1000.
    pub fn ratio_to(&self, other: SiPrefix) -> f64 {
        10f64.powi(self.exponent() - other.exponent())
    }
}

impl Display for SiPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SiPrefix::Pico => write!(f, "p"),
            SiPrefix::Nano => write!(f, "n"),
            SiPrefix::Micro => write!(f, "u"),
            SiPrefix::Milli => write!(f, "m"),
            SiPrefix::None => Ok(()),
        }
    }
}

/// Converts `value` given in `from` units to an integer number of `to` units,
/// rounded to the nearest multiple of `step`.
///
/// Values that fall within the same rounding interval map to the same integer,
/// which makes geometry derived from them identical.
pub fn snap_value(value: f64, from: SiPrefix, to: SiPrefix, step: i64) -> i64 {
    assert!(step > 0);
    let scaled = value * from.ratio_to(to) / step as f64;
    scaled.round() as i64 * step
}

/// Converts an integer number of `from` units to a floating point value in `to` units.
///
/// Shrinking conversions divide by an exact power of ten, so 24400 nm reads back as 24.4 um.
pub fn to_float(value: i64, from: SiPrefix, to: SiPrefix) -> f64 {
    let exp = from.exponent() - to.exponent();
    if exp < 0 {
        value as f64 / 10f64.powi(-exp)
    } else {
        value as f64 * 10f64.powi(exp)
    }
}
