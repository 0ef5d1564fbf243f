use serde::{Deserialize, Serialize};

use super::{SampleKind, Sideband};
use crate::prelude::{DispersionError, DispersionResult};
use crate::units::{Frequency, Time};

/// Metadata of a concrete sample source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub sample_rate: Frequency,
    pub start_time: Time,
    pub frequency: Vec<Frequency>,
    pub sideband: Vec<Sideband>,
    pub kind: SampleKind,
    pub samples_per_frame: usize,
}

impl StreamInfo {
    /// Complex, upper-sideband channels all at `frequency`.
    pub fn new(
        sample_rate: Frequency,
        start_time: Time,
        frequency: Frequency,
        channels: usize,
    ) -> Self {
        Self {
            sample_rate,
            start_time,
            frequency: vec![frequency; channels],
            sideband: vec![Sideband::Upper; channels],
            kind: SampleKind::Complex,
            samples_per_frame: 1,
        }
    }

    pub fn with_sidebands(mut self, sideband: Vec<Sideband>) -> Self {
        self.sideband = sideband;
        self
    }

    pub fn with_kind(mut self, kind: SampleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_samples_per_frame(mut self, samples_per_frame: usize) -> Self {
        self.samples_per_frame = samples_per_frame;
        self
    }

    pub fn n_channels(&self) -> usize {
        self.frequency.len()
    }

    /// Checks the metadata describes `channels` channels consistently.
    pub fn validate(&self, channels: usize) -> DispersionResult<()> {
        if !self.sample_rate.is_physical() {
            return Err(DispersionError::InvalidQuantity(format!(
                "sample rate {} must be positive",
                self.sample_rate
            )));
        }
        if self.frequency.len() != channels || self.sideband.len() != channels {
            return Err(DispersionError::InvalidQuantity(format!(
                "{} frequencies and {} sidebands for {} channels",
                self.frequency.len(),
                self.sideband.len(),
                channels
            )));
        }
        if let Some(bad) = self.frequency.iter().find(|f| !f.is_physical()) {
            return Err(DispersionError::InvalidQuantity(format!(
                "channel frequency {} must be positive",
                bad
            )));
        }
        if self.samples_per_frame == 0 {
            return Err(DispersionError::InvalidQuantity(
                "samples_per_frame must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
