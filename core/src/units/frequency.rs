use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{parse_quantity, scalar_quantity, Dimension};
use crate::prelude::DispersionError;

/// A frequency, stored in Hz.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency(f64);

impl Frequency {
    pub const fn from_hz(hz: f64) -> Self {
        Self(hz)
    }

    pub fn from_khz(khz: f64) -> Self {
        Self(khz * 1e3)
    }

    pub fn from_mhz(mhz: f64) -> Self {
        Self(mhz * 1e6)
    }

    pub fn from_ghz(ghz: f64) -> Self {
        Self(ghz * 1e9)
    }

    pub fn hz(self) -> f64 {
        self.0
    }

    pub fn mhz(self) -> f64 {
        self.0 / 1e6
    }

    /// True for a finite, strictly positive frequency.
    pub fn is_physical(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }

    pub fn min(self, other: Frequency) -> Frequency {
        Frequency(self.0.min(other.0))
    }

    pub fn max(self, other: Frequency) -> Frequency {
        Frequency(self.0.max(other.0))
    }
}

scalar_quantity!(Frequency);

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MHz", self.mhz())
    }
}

impl FromStr for Frequency {
    type Err = DispersionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_quantity(text, Dimension::Frequency).map(Frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_parses_and_displays_in_mhz() {
        let f: Frequency = "128 kHz".parse().unwrap();
        assert_eq!(f.hz(), 128e3);
        assert_eq!(Frequency::from_mhz(300.0).to_string(), "300 MHz");
    }

    #[test]
    fn frequency_arithmetic_stays_in_hz() {
        let centre = Frequency::from_mhz(300.0);
        let rate = Frequency::from_khz(128.0);
        assert_eq!((centre - rate / 2.0).hz(), 299_936_000.0);
        assert_eq!((centre + rate / 2.0).hz(), 300_064_000.0);
        assert_eq!(rate / Frequency::from_khz(64.0), 2.0);
    }

    #[test]
    fn frequency_serializes_as_unit_string() {
        let json = serde_json::to_string(&Frequency::from_mhz(300.0)).unwrap();
        assert_eq!(json, "\"300 MHz\"");
        let back: Frequency = serde_json::from_str("\"0.3 GHz\"").unwrap();
        assert_eq!(back, Frequency::from_mhz(300.0));
    }
}
