use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::prelude::{DispersionError, DispersionResult};
use crate::units::{parse_quantity, Dimension, Frequency, Phase, TimeDelta};

/// Dispersion delay constant in s MHz^2 cm^3 / pc.
pub const DISPERSION_DELAY_CONSTANT: f64 = 1.0 / 2.41e-4;

/// Same constant in s Hz^2 cm^3 / pc.
const DELAY_CONSTANT_HZ: f64 = DISPERSION_DELAY_CONSTANT * 1e12;

/// Column density of free electrons along the line of sight, in pc/cm^3.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DispersionMeasure(f64);

impl DispersionMeasure {
    pub fn new(value: f64) -> DispersionResult<Self> {
        if !value.is_finite() {
            return Err(DispersionError::InvalidQuantity(format!(
                "dispersion measure {} is not finite",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Value in pc/cm^3.
    pub fn value(self) -> f64 {
        self.0
    }

    fn delay_scale(self) -> f64 {
        DELAY_CONSTANT_HZ * self.0
    }

    /// Group delay of `f1` relative to `f2`.
    ///
    /// Positive when `f1 < f2` for a positive measure: lower frequencies
    /// arrive later.
    pub fn time_delay(self, f1: Frequency, f2: Frequency) -> TimeDelta {
        let (a, b) = (f1.hz(), f2.hz());
        // (1/a^2 - 1/b^2) written to stay exactly antisymmetric.
        let product = a * b;
        TimeDelta::from_seconds(self.delay_scale() * (b - a) * (b + a) / (product * product))
    }

    /// Dispersive phase of `f` relative to the reference `fref`.
    ///
    /// Its derivative with respect to `f` is `-time_delay(f, fref)`, so
    /// multiplying a spectrum by `exp(+i phase_delay)` delays every
    /// component by its dispersion delay.
    pub fn phase_delay(self, f: Frequency, fref: Frequency) -> Phase {
        let (a, r) = (f.hz(), fref.hz());
        let offset = a - r;
        Phase::from_cycles(self.delay_scale() * offset * offset / (a * r * r))
    }

    /// `exp(i phase_delay(f, fref))`.
    pub fn phase_factor(self, f: Frequency, fref: Frequency) -> Complex64 {
        self.phase_delay(f, fref).phasor()
    }
}

impl Neg for DispersionMeasure {
    type Output = DispersionMeasure;

    fn neg(self) -> DispersionMeasure {
        DispersionMeasure(-self.0)
    }
}

impl fmt::Display for DispersionMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pc/cm3", self.0)
    }
}

impl FromStr for DispersionMeasure {
    type Err = DispersionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_quantity(text, Dimension::DispersionMeasure).and_then(DispersionMeasure::new)
    }
}

impl TryFrom<String> for DispersionMeasure {
    type Error = DispersionError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<DispersionMeasure> for String {
    fn from(value: DispersionMeasure) -> String {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Delay of 0.05 s across 128 kHz at 300 MHz.
    fn pulse_dm() -> DispersionMeasure {
        DispersionMeasure::new(1000.0 * 0.05 / 0.039342251).unwrap()
    }

    #[test]
    fn time_delay_across_band_matches_design_value() {
        let dm = pulse_dm();
        let delay = dm.time_delay(Frequency::from_mhz(299.936), Frequency::from_mhz(300.064));
        assert!((delay.seconds() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn time_delay_is_antisymmetric_and_zero_on_equal_frequencies() {
        let dm = pulse_dm();
        let frequencies = [299.872, 299.936, 300.0, 300.0123456789, 300.064, 1400.0];
        for &a in &frequencies {
            for &b in &frequencies {
                let (fa, fb) = (Frequency::from_mhz(a), Frequency::from_mhz(b));
                assert_eq!(dm.time_delay(fa, fb), -dm.time_delay(fb, fa));
            }
            let f = Frequency::from_mhz(a);
            assert_eq!(dm.time_delay(f, f).seconds(), 0.0);
        }
    }

    #[test]
    fn lower_frequencies_arrive_later() {
        let dm = pulse_dm();
        let low = Frequency::from_mhz(299.0);
        let high = Frequency::from_mhz(301.0);
        assert!(dm.time_delay(low, high).seconds() > 0.0);
        assert!((-dm).time_delay(low, high).seconds() < 0.0);
        assert_eq!((-dm).value(), -dm.value());
    }

    #[test]
    fn phase_delay_slope_is_minus_time_delay() {
        let dm = pulse_dm();
        let fref = Frequency::from_mhz(300.0);
        let f = Frequency::from_mhz(299.95);
        let step = Frequency::from_hz(1.0);
        let slope = (dm.phase_delay(f + step, fref) - dm.phase_delay(f - step, fref)).cycles()
            / (2.0 * step.hz());
        let delay = dm.time_delay(f, fref).seconds();
        assert!((slope + delay).abs() < 1e-6 * delay.abs());
        assert_eq!(dm.phase_delay(fref, fref).cycles(), 0.0);
        assert!((dm.phase_factor(f, fref).norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn dispersion_measure_parses_with_dimension_check() {
        let dm: DispersionMeasure = "12.5 pc/cm3".parse().unwrap();
        assert_eq!(dm.value(), 12.5);
        assert!(matches!(
            "12.5 MHz".parse::<DispersionMeasure>(),
            Err(DispersionError::Dimension { .. })
        ));
        assert!(DispersionMeasure::new(f64::NAN).is_err());
    }
}
