use serde::{Deserialize, Serialize};

use crate::processing::reference::ReferenceFrequency;
use crate::stream::Sideband;
use crate::units::Frequency;

/// Options shared by `Disperse` and `Dedisperse`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Frequency all delays are referred to; the band centre when absent.
    pub reference_frequency: ReferenceFrequency,
    /// Number of wrapped samples filtered in one go. Output frames are
    /// shorter by the padding.
    pub frame_size: Option<usize>,
    /// Per-channel frequency overriding the wrapped stream's.
    pub frequency: Option<Vec<Frequency>>,
    /// Per-channel sideband overriding the wrapped stream's.
    pub sideband: Option<Vec<Sideband>>,
}

impl FilterOptions {
    pub fn with_reference(reference_frequency: impl Into<ReferenceFrequency>) -> Self {
        Self {
            reference_frequency: reference_frequency.into(),
            ..Default::default()
        }
    }

    pub fn frame_size(mut self, frame_size: usize) -> Self {
        self.frame_size = Some(frame_size);
        self
    }
}

/// Common error type for quantities, streams and filters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DispersionError {
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("dimension mismatch: expected {expected}, found {found}")]
    Dimension {
        expected: &'static str,
        found: String,
    },
    #[error("cannot construct filter: {0}")]
    Construction(String),
    #[error("samples {start}..{end} outside stream of {len} samples")]
    OutOfBounds { start: i64, end: i64, len: usize },
    #[error("invalid seek: {0}")]
    InvalidSeek(String),
    #[error("transform failure: {0}")]
    Fft(String),
    #[error("stream failure: {0}")]
    Stream(String),
}

pub type DispersionResult<T> = Result<T, DispersionError>;
