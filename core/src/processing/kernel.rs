//! Padding, frame sizing and the Fourier-domain phase kernel.

use num_complex::Complex64;

use super::reference::ChannelBand;
use crate::dispersion::DispersionMeasure;
use crate::math::freq::{baseband_frequencies, next_fast_len};
use crate::prelude::{DispersionError, DispersionResult};
use crate::stream::{SampleKind, Sideband};
use crate::units::{Frequency, Phase, TimeDelta};

/// Sample offsets closer than this to an integer are treated as integral.
const SAMPLE_SNAP: f64 = 1e-6;

/// Largest sample count an f64 holds exactly (2^53).
const MAX_EXACT_SAMPLES: f64 = 9_007_199_254_740_992.0;

/// Largest and smallest group delay a filter applies across all channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelaySpan {
    pub max: TimeDelta,
    pub min: TimeDelta,
}

impl DelaySpan {
    /// Delays of every band edge relative to its channel's reference.
    pub fn across(dm: DispersionMeasure, bands: &[ChannelBand], references: &[Frequency]) -> Self {
        let mut span = DelaySpan {
            max: TimeDelta::from_seconds(f64::NEG_INFINITY),
            min: TimeDelta::from_seconds(f64::INFINITY),
        };
        for (band, &reference) in bands.iter().zip(references) {
            for edge in band.edges() {
                let delay = dm.time_delay(edge, reference);
                span.max = span.max.max(delay);
                span.min = span.min.min(delay);
            }
        }
        span
    }
}

/// How output samples map onto the wrapped stream.
///
/// Output sample `j` is computed from wrapped samples `j..=j + padding()`
/// and is stamped `lead` samples after the wrapped sample `j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// `ceil` of the largest delay, in samples.
    pub lead: i64,
    /// `floor` of the smallest delay, in samples.
    pub trail: i64,
    /// Wrapped samples filtered per frame; the transform length.
    pub frame_size: usize,
}

impl FrameLayout {
    /// Lays out frames for `span` at `sample_rate`.
    ///
    /// Without a requested size the frame is the smallest power of two that
    /// is at least four times the padding and the wrapped stream's preferred
    /// frame, capped at the wrapped stream's length.
    pub fn new(
        span: DelaySpan,
        sample_rate: Frequency,
        requested: Option<usize>,
        preferred: usize,
        available: usize,
    ) -> DispersionResult<Self> {
        let lead = whole_samples((span.max.samples(sample_rate) - SAMPLE_SNAP).ceil())?;
        let trail = whole_samples((span.min.samples(sample_rate) + SAMPLE_SNAP).floor())?;
        let padding = lead
            .checked_sub(trail)
            .and_then(|padding| usize::try_from(padding).ok())
            .ok_or_else(|| {
                DispersionError::Construction(format!(
                    "delays from {} to {} samples do not give a padding",
                    trail, lead
                ))
            })?;
        let frame_size = match requested {
            Some(size) => size,
            None => next_fast_len(4 * padding)
                .max(next_fast_len(preferred))
                .min(available),
        };
        if frame_size <= padding {
            return Err(DispersionError::Construction(format!(
                "frame of {} samples cannot hold {} samples of padding",
                frame_size, padding
            )));
        }
        if frame_size > available {
            return Err(DispersionError::Construction(format!(
                "wrapped stream of {} samples is shorter than one frame of {}",
                available, frame_size
            )));
        }
        Ok(Self {
            lead,
            trail,
            frame_size,
        })
    }

    pub fn padding(&self) -> usize {
        (self.lead - self.trail).max(0) as usize
    }

    /// Output samples produced per frame.
    pub fn samples_per_frame(&self) -> usize {
        self.frame_size - self.padding()
    }

    /// Offset of the output start time from the wrapped start time.
    pub fn start_offset(&self, sample_rate: Frequency) -> TimeDelta {
        TimeDelta::from_samples(self.lead as f64, sample_rate)
    }
}

/// Delay in whole samples, or a construction error when it cannot be
/// represented exactly.
fn whole_samples(samples: f64) -> DispersionResult<i64> {
    if !samples.is_finite() || samples.abs() > MAX_EXACT_SAMPLES {
        return Err(DispersionError::Construction(format!(
            "delay of {} samples is out of range",
            samples
        )));
    }
    Ok(samples as i64)
}

/// Per-channel spectral gains applied to every frame.
#[derive(Debug, Clone)]
pub struct PhaseKernel {
    channels: Vec<Vec<Complex64>>,
}

impl PhaseKernel {
    /// Gain `exp(2 pi i (s * phase_delay(f, ref) + nu * lead / rate))` for
    /// every bin of baseband frequency `nu` and sky frequency
    /// `f = fc + s * nu`.
    ///
    /// The linear term takes out the integer lead so no output sample
    /// depends on wrapped samples before it.
    pub fn build(
        dm: DispersionMeasure,
        frequency: &[Frequency],
        sideband: &[Sideband],
        references: &[Frequency],
        sample_rate: Frequency,
        kind: SampleKind,
        layout: &FrameLayout,
    ) -> Self {
        let axis = baseband_frequencies(layout.frame_size, sample_rate, kind);
        let lead = layout.start_offset(sample_rate);
        let channels = frequency
            .iter()
            .zip(sideband)
            .zip(references)
            .map(|((&centre, &sideband), &reference)| {
                let sign = sideband.sign();
                // Phase runs backwards with baseband frequency in a lower sideband.
                let channel_dm = match sideband {
                    Sideband::Upper => dm,
                    Sideband::Lower => -dm,
                };
                let mut gains: Vec<Complex64> = axis
                    .iter()
                    .map(|&nu| {
                        let sky = centre + nu * sign;
                        let shift = Phase::from_cycles(lead * nu).phasor();
                        channel_dm.phase_factor(sky, reference) * shift
                    })
                    .collect();
                if kind == SampleKind::Real {
                    snap_to_real(&mut gains[0]);
                    if layout.frame_size % 2 == 0 {
                        if let Some(nyquist) = gains.last_mut() {
                            snap_to_real(nyquist);
                        }
                    }
                }
                gains
            })
            .collect();
        Self { channels }
    }

    pub fn channel(&self, index: usize) -> &[Complex64] {
        &self.channels[index]
    }

    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }
}

/// Real-signal DC and Nyquist bins only take a real gain; keep its sign.
fn snap_to_real(gain: &mut Complex64) {
    let sign = if gain.re < 0.0 { -1.0 } else { 1.0 };
    *gain = Complex64::new(sign, 0.0);
}
