//! The sample-stream contract shared by sources and filters.
//!
//! A stream is a seekable tape of `(samples, channels)` baseband data with
//! fixed metadata. Filters consume one stream and are streams themselves, so
//! chains are built by composition.

pub mod array;
pub mod generator;
pub mod info;

pub use array::ArrayStream;
pub use generator::{impulse_stream, StreamGenerator};
pub use info::StreamInfo;

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::prelude::{DispersionError, DispersionResult};
use crate::units::{Frequency, Time, TimeDelta};

/// Whether samples are real or complex valued.
///
/// Real samples are carried as `Complex64` with a zero imaginary part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    Real,
    Complex,
}

/// Direction of sky frequency with increasing transform bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sideband {
    Upper,
    Lower,
}

impl Sideband {
    /// `+1` for the upper, `-1` for the lower sideband.
    pub fn sign(self) -> f64 {
        match self {
            Sideband::Upper => 1.0,
            Sideband::Lower => -1.0,
        }
    }
}

/// Target of a seek.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekOffset {
    Samples(i64),
    Time(Time),
    Delta(TimeDelta),
}

impl From<i64> for SeekOffset {
    fn from(samples: i64) -> Self {
        SeekOffset::Samples(samples)
    }
}

impl From<Time> for SeekOffset {
    fn from(time: Time) -> Self {
        SeekOffset::Time(time)
    }
}

impl From<TimeDelta> for SeekOffset {
    fn from(delta: TimeDelta) -> Self {
        SeekOffset::Delta(delta)
    }
}

/// Origin of a seek, as in `io::SeekFrom` (0, 1, 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// A seekable source of baseband samples.
pub trait SampleStream {
    /// `(samples, channels)`.
    fn shape(&self) -> (usize, usize);
    fn sample_rate(&self) -> Frequency;
    /// Per-channel frequency: band centre for complex data, the frequency
    /// at zero baseband frequency for real data.
    fn frequency(&self) -> &[Frequency];
    fn sideband(&self) -> &[Sideband];
    fn start_time(&self) -> Time;
    fn samples_per_frame(&self) -> usize;
    fn kind(&self) -> SampleKind;

    fn tell(&self) -> usize;
    fn seek(&mut self, offset: SeekOffset, whence: Whence) -> DispersionResult<usize>;
    /// Reads `count` samples from the cursor, shaped `(count, channels)`.
    fn read(&mut self, count: usize) -> DispersionResult<Array2<Complex64>>;

    fn len(&self) -> usize {
        self.shape().0
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn n_channels(&self) -> usize {
        self.shape().1
    }

    fn is_complex(&self) -> bool {
        self.kind() == SampleKind::Complex
    }

    fn stop_time(&self) -> Time {
        self.start_time() + TimeDelta::from_samples(self.len() as f64, self.sample_rate())
    }

    /// Time of the sample under the cursor.
    fn time(&self) -> Time {
        self.start_time() + TimeDelta::from_samples(self.tell() as f64, self.sample_rate())
    }

    fn read_remaining(&mut self) -> DispersionResult<Array2<Complex64>> {
        let remaining = self.len().saturating_sub(self.tell());
        self.read(remaining)
    }
}

impl<S: SampleStream + ?Sized> SampleStream for Box<S> {
    fn shape(&self) -> (usize, usize) {
        (**self).shape()
    }

    fn sample_rate(&self) -> Frequency {
        (**self).sample_rate()
    }

    fn frequency(&self) -> &[Frequency] {
        (**self).frequency()
    }

    fn sideband(&self) -> &[Sideband] {
        (**self).sideband()
    }

    fn start_time(&self) -> Time {
        (**self).start_time()
    }

    fn samples_per_frame(&self) -> usize {
        (**self).samples_per_frame()
    }

    fn kind(&self) -> SampleKind {
        (**self).kind()
    }

    fn tell(&self) -> usize {
        (**self).tell()
    }

    fn seek(&mut self, offset: SeekOffset, whence: Whence) -> DispersionResult<usize> {
        (**self).seek(offset, whence)
    }

    fn read(&mut self, count: usize) -> DispersionResult<Array2<Complex64>> {
        (**self).read(count)
    }
}

/// New cursor position for a seek on a stream with the given geometry.
pub fn resolve_seek(
    offset: SeekOffset,
    whence: Whence,
    current: usize,
    len: usize,
    start_time: Time,
    sample_rate: Frequency,
) -> DispersionResult<usize> {
    let samples = match offset {
        SeekOffset::Samples(samples) => samples,
        SeekOffset::Delta(delta) => delta.samples(sample_rate).round() as i64,
        SeekOffset::Time(time) => {
            if whence != Whence::Start {
                return Err(DispersionError::InvalidSeek(format!(
                    "absolute time {} needs a seek from the start",
                    time
                )));
            }
            (time - start_time).samples(sample_rate).round() as i64
        }
    };
    let origin = match whence {
        Whence::Start => 0,
        Whence::Current => current as i64,
        Whence::End => len as i64,
    };
    let target = origin.checked_add(samples).ok_or(DispersionError::OutOfBounds {
        start: origin,
        end: i64::MAX,
        len,
    })?;
    if target < 0 {
        return Err(DispersionError::OutOfBounds {
            start: target,
            end: target,
            len,
        });
    }
    Ok(target as usize)
}

/// Checks that `count` samples can be read from `position`.
pub fn check_window(position: usize, count: usize, len: usize) -> DispersionResult<()> {
    let fits = position.checked_add(count).is_some_and(|end| end <= len);
    if !fits {
        return Err(DispersionError::OutOfBounds {
            start: i64::try_from(position).unwrap_or(i64::MAX),
            end: i64::try_from(position.saturating_add(count)).unwrap_or(i64::MAX),
            len,
        });
    }
    Ok(())
}
