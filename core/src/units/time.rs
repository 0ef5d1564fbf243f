use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{parse_quantity, scalar_quantity, Dimension, Frequency};
use crate::prelude::DispersionError;

/// A signed duration, stored in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeDelta(f64);

impl TimeDelta {
    pub const ZERO: TimeDelta = TimeDelta(0.0);

    pub const fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    /// Duration of `count` samples at `rate`.
    pub fn from_samples(count: f64, rate: Frequency) -> Self {
        Self(count / rate.hz())
    }

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Number of samples spanned at `rate`; not rounded.
    pub fn samples(self, rate: Frequency) -> f64 {
        self.0 * rate.hz()
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn max(self, other: TimeDelta) -> TimeDelta {
        TimeDelta(self.0.max(other.0))
    }

    pub fn min(self, other: TimeDelta) -> TimeDelta {
        TimeDelta(self.0.min(other.0))
    }
}

scalar_quantity!(TimeDelta);

impl Mul<Frequency> for TimeDelta {
    type Output = f64;

    fn mul(self, rhs: Frequency) -> f64 {
        self.0 * rhs.hz()
    }
}

impl fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} s", self.0)
    }
}

impl FromStr for TimeDelta {
    type Err = DispersionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_quantity(text, Dimension::Time).map(TimeDelta)
    }
}

/// An absolute instant (UTC, Unix epoch).
///
/// Whole seconds and the fraction of a second are kept apart so offsets of
/// single samples stay exact to well below a nanosecond for present-day
/// epochs.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Time {
    seconds: i64,
    fraction: f64,
}

impl Time {
    pub fn from_unix(seconds: i64) -> Self {
        Self {
            seconds,
            fraction: 0.0,
        }
    }

    pub fn from_unix_f64(seconds: f64) -> Self {
        Self::normalized(0, seconds)
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self::normalized(
            datetime.timestamp(),
            datetime.timestamp_subsec_nanos() as f64 * 1e-9,
        )
    }

    fn normalized(seconds: i64, fraction: f64) -> Self {
        let whole = fraction.floor();
        let rest = fraction - whole;
        // Tiny negative fractions round up to a whole second.
        if rest >= 1.0 {
            return Self {
                seconds: seconds + whole as i64 + 1,
                fraction: 0.0,
            };
        }
        Self {
            seconds: seconds + whole as i64,
            fraction: rest,
        }
    }

    pub fn unix_seconds(self) -> i64 {
        self.seconds
    }

    pub fn fraction(self) -> f64 {
        self.fraction
    }
}

impl Add<TimeDelta> for Time {
    type Output = Time;

    fn add(self, rhs: TimeDelta) -> Time {
        Time::normalized(self.seconds, self.fraction + rhs.seconds())
    }
}

impl Sub<TimeDelta> for Time {
    type Output = Time;

    fn sub(self, rhs: TimeDelta) -> Time {
        Time::normalized(self.seconds, self.fraction - rhs.seconds())
    }
}

impl Sub for Time {
    type Output = TimeDelta;

    fn sub(self, rhs: Time) -> TimeDelta {
        let whole = (self.seconds - rhs.seconds) as f64;
        TimeDelta::from_seconds(whole + (self.fraction - rhs.fraction))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut seconds = self.seconds;
        let mut nanos = (self.fraction * 1e9).round() as u32;
        if nanos >= 1_000_000_000 {
            seconds += 1;
            nanos = 0;
        }
        let datetime = DateTime::<Utc>::from_timestamp(seconds, nanos).ok_or(fmt::Error)?;
        if nanos == 0 {
            write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%S"))
        } else {
            write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.9f"))
        }
    }
}

impl FromStr for Time {
    type Err = DispersionError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
            return Ok(Time::from_datetime(datetime.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| Time::from_datetime(naive.and_utc()))
            .map_err(|err| DispersionError::InvalidQuantity(format!("time '{}': {}", text, err)))
    }
}

impl TryFrom<String> for Time {
    type Error = DispersionError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<Time> for String {
    fn from(value: Time) -> String {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_parses_iso_strings() {
        let time: Time = "2010-11-12T13:14:15".parse().unwrap();
        assert_eq!(time.unix_seconds(), 1_289_567_655);
        assert_eq!(time.fraction(), 0.0);
        assert_eq!(time.to_string(), "2010-11-12T13:14:15");
        let zoned: Time = "2010-11-12T13:14:15Z".parse().unwrap();
        assert_eq!(zoned, time);
    }

    #[test]
    fn time_offsets_keep_sample_resolution() {
        let start: Time = "2010-11-12T13:14:15".parse().unwrap();
        let rate = Frequency::from_khz(128.0);
        let later = start + TimeDelta::from_samples(64_000.0, rate);
        assert_eq!((later - start).seconds(), 0.5);
        let one = start + TimeDelta::from_samples(1.0, rate);
        assert!(((one - start).samples(rate) - 1.0).abs() < 1e-9);
        let earlier = start - TimeDelta::from_seconds(0.25);
        assert_eq!(earlier.unix_seconds(), start.unix_seconds() - 1);
        assert_eq!(earlier.fraction(), 0.75);
        assert!(earlier < start);
    }

    #[test]
    fn tiny_negative_offsets_stay_normalized() {
        let time = Time::from_unix(10) - TimeDelta::from_seconds(1e-17);
        assert_eq!(time, Time::from_unix(10));
        assert!(time.fraction() < 1.0);
        let earlier = Time::from_unix(10) - TimeDelta::from_seconds(0.25);
        assert_eq!(earlier.unix_seconds(), 9);
        assert_eq!(earlier.fraction(), 0.75);
    }

    #[test]
    fn time_delta_parses_with_unit() {
        let delta: TimeDelta = "25 ms".parse().unwrap();
        assert!((delta.seconds() - 0.025).abs() < 1e-15);
        assert!("25 MHz".parse::<TimeDelta>().is_err());
    }
}
