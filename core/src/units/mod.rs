//! Physical quantities used throughout the crate.
//!
//! Values are stored in base units (Hz, seconds, cycles, pc/cm^3) and
//! carried in newtypes so a frequency can never be passed where a delay is
//! expected. Strings such as `"300 MHz"` are parsed with a dimension check,
//! which is also how every quantity (de)serializes.

pub mod frequency;
pub mod phase;
pub mod time;

pub use frequency::Frequency;
pub use phase::Phase;
pub use time::{Time, TimeDelta};

use crate::prelude::{DispersionError, DispersionResult};

/// Physical dimension of a parsed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Frequency,
    Time,
    Angle,
    DispersionMeasure,
}

impl Dimension {
    pub fn name(self) -> &'static str {
        match self {
            Dimension::Frequency => "frequency",
            Dimension::Time => "time",
            Dimension::Angle => "angle",
            Dimension::DispersionMeasure => "dispersion measure",
        }
    }
}

/// Dimension and scale to base units of a unit symbol.
fn unit_scale(unit: &str) -> Option<(Dimension, f64)> {
    let compact: String = unit.chars().filter(|c| !c.is_whitespace()).collect();
    let entry = match compact.as_str() {
        "Hz" => (Dimension::Frequency, 1.0),
        "kHz" => (Dimension::Frequency, 1e3),
        "MHz" => (Dimension::Frequency, 1e6),
        "GHz" => (Dimension::Frequency, 1e9),
        "s" => (Dimension::Time, 1.0),
        "ms" => (Dimension::Time, 1e-3),
        "us" => (Dimension::Time, 1e-6),
        "ns" => (Dimension::Time, 1e-9),
        "cycle" | "cy" => (Dimension::Angle, 1.0),
        "rad" => (Dimension::Angle, 1.0 / std::f64::consts::TAU),
        "deg" => (Dimension::Angle, 1.0 / 360.0),
        "pc/cm3" | "pc/cm^3" | "pc/cm**3" | "pccm-3" | "pccm^-3" => {
            (Dimension::DispersionMeasure, 1.0)
        }
        _ => return None,
    };
    Some(entry)
}

/// Splits `"1.5e3 kHz"` or `"300MHz"` into its number and unit parts.
fn split_number(text: &str) -> (&str, &str) {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    for (pos, &(idx, c)) in chars.iter().enumerate() {
        if c.is_whitespace() {
            return (&text[..idx], &text[idx..]);
        }
        if c.is_alphabetic() {
            let exponent = matches!(c, 'e' | 'E')
                && chars
                    .get(pos + 1)
                    .map(|&(_, next)| next.is_ascii_digit() || next == '+' || next == '-')
                    .unwrap_or(false);
            if !exponent {
                return (&text[..idx], &text[idx..]);
            }
        }
    }
    (text, "")
}

/// Parses `"<number> <unit>"` into a value in base units of `expected`.
pub fn parse_quantity(text: &str, expected: Dimension) -> DispersionResult<f64> {
    let text = text.trim();
    let (number, unit) = split_number(text);
    let unit = unit.trim();
    if unit.is_empty() {
        return Err(DispersionError::InvalidQuantity(format!(
            "'{}' has no unit",
            text
        )));
    }
    let (dimension, scale) = unit_scale(unit).ok_or_else(|| {
        DispersionError::InvalidQuantity(format!("unknown unit '{}' in '{}'", unit, text))
    })?;
    if dimension != expected {
        return Err(DispersionError::Dimension {
            expected: expected.name(),
            found: format!("{} ({})", text, dimension.name()),
        });
    }
    let value: f64 = number.trim().parse().map_err(|_| {
        DispersionError::InvalidQuantity(format!("cannot parse number in '{}'", text))
    })?;
    let scaled = value * scale;
    if !scaled.is_finite() {
        return Err(DispersionError::InvalidQuantity(format!(
            "'{}' is not finite",
            text
        )));
    }
    Ok(scaled)
}

/// Arithmetic shared by the scalar quantity newtypes.
macro_rules! scalar_quantity {
    ($name:ident) => {
        impl std::ops::Add for $name {
            type Output = $name;
            fn add(self, rhs: $name) -> $name {
                $name(self.0 + rhs.0)
            }
        }

        impl std::ops::Sub for $name {
            type Output = $name;
            fn sub(self, rhs: $name) -> $name {
                $name(self.0 - rhs.0)
            }
        }

        impl std::ops::Neg for $name {
            type Output = $name;
            fn neg(self) -> $name {
                $name(-self.0)
            }
        }

        impl std::ops::Mul<f64> for $name {
            type Output = $name;
            fn mul(self, rhs: f64) -> $name {
                $name(self.0 * rhs)
            }
        }

        impl std::ops::Div<f64> for $name {
            type Output = $name;
            fn div(self, rhs: f64) -> $name {
                $name(self.0 / rhs)
            }
        }

        impl std::ops::Div for $name {
            type Output = f64;
            fn div(self, rhs: $name) -> f64 {
                self.0 / rhs.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = crate::prelude::DispersionError;
            fn try_from(text: String) -> Result<Self, Self::Error> {
                text.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.to_string()
            }
        }
    };
}

pub(crate) use scalar_quantity;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quantity_scales_to_base_units() {
        assert_eq!(parse_quantity("128 kHz", Dimension::Frequency).unwrap(), 128e3);
        assert_eq!(parse_quantity("300MHz", Dimension::Frequency).unwrap(), 300e6);
        assert_eq!(parse_quantity("1.5e-3 s", Dimension::Time).unwrap(), 1.5e-3);
        assert_eq!(parse_quantity("2e3ms", Dimension::Time).unwrap(), 2.0);
        assert_eq!(
            parse_quantity("12.5 pc / cm3", Dimension::DispersionMeasure).unwrap(),
            12.5
        );
    }

    #[test]
    fn parse_quantity_rejects_wrong_dimension() {
        let err = parse_quantity("300 s", Dimension::Frequency).unwrap_err();
        assert!(matches!(
            err,
            DispersionError::Dimension {
                expected: "frequency",
                ..
            }
        ));
    }

    #[test]
    fn parse_quantity_rejects_missing_or_unknown_units() {
        assert!(matches!(
            parse_quantity("300", Dimension::Frequency),
            Err(DispersionError::InvalidQuantity(_))
        ));
        assert!(matches!(
            parse_quantity("300 furlong", Dimension::Frequency),
            Err(DispersionError::InvalidQuantity(_))
        ));
        assert!(matches!(
            parse_quantity("abc MHz", Dimension::Frequency),
            Err(DispersionError::InvalidQuantity(_))
        ));
    }
}
