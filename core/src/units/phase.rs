use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::{parse_quantity, scalar_quantity, Dimension};
use crate::prelude::DispersionError;

/// An angle, stored in cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phase(f64);

impl Phase {
    pub const fn from_cycles(cycles: f64) -> Self {
        Self(cycles)
    }

    pub fn from_radians(radians: f64) -> Self {
        Self(radians / TAU)
    }

    pub fn cycles(self) -> f64 {
        self.0
    }

    pub fn radians(self) -> f64 {
        self.0 * TAU
    }

    /// `exp(i * phase)`.
    pub fn phasor(self) -> Complex64 {
        Complex64::from_polar(1.0, self.radians())
    }
}

scalar_quantity!(Phase);

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cycle", self.0)
    }
}

impl FromStr for Phase {
    type Err = DispersionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_quantity(text, Dimension::Angle).map(Phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_cycle_phasor_is_imaginary_unit() {
        let phasor = Phase::from_cycles(0.25).phasor();
        assert!((phasor - Complex64::new(0.0, 1.0)).norm() < 1e-15);
        let parsed: Phase = "90 deg".parse().unwrap();
        assert!((parsed.cycles() - 0.25).abs() < 1e-15);
    }
}
