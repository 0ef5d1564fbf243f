use anyhow::{bail, Context};
use dispcore::stream::{impulse_stream, ArrayStream, StreamInfo};
use dispcore::units::{Frequency, Time};
use dispcore::{SampleKind, SampleStream, Sideband};
use ndarray::Array2;
use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for a synthetic giant-pulse source: a unit impulse in every
/// channel, optionally buried in uniform noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub sample_rate: Frequency,
    pub frequency: Frequency,
    pub sidebands: Vec<Sideband>,
    pub complex: bool,
    pub start_time: Time,
    pub samples: usize,
    pub pulse_sample: usize,
    pub noise: f64,
    pub seed: u64,
    pub samples_per_frame: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sample_rate: Frequency::from_khz(128.0),
            frequency: Frequency::from_mhz(300.0),
            sidebands: vec![Sideband::Upper, Sideband::Lower],
            complex: true,
            // 2010-11-12T13:14:15
            start_time: Time::from_unix(1_289_567_655),
            samples: 164_000,
            pulse_sample: 64_000,
            noise: 0.0,
            seed: 0,
            samples_per_frame: 1000,
        }
    }
}

impl SourceConfig {
    pub fn kind(&self) -> SampleKind {
        if self.complex {
            SampleKind::Complex
        } else {
            SampleKind::Real
        }
    }

    pub fn stream_info(&self) -> StreamInfo {
        StreamInfo::new(self.sample_rate, self.start_time, self.frequency, self.sidebands.len())
            .with_sidebands(self.sidebands.clone())
            .with_kind(self.kind())
            .with_samples_per_frame(self.samples_per_frame.max(1))
    }
}

fn build_noisy_samples(config: &SourceConfig) -> anyhow::Result<Array2<Complex64>> {
    let channels = config.sidebands.len();
    config
        .samples
        .checked_mul(channels)
        .context("overflow computing sample count for generator")?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut samples = Array2::from_shape_simple_fn((config.samples, channels), || {
        Complex64::new(
            rng.gen_range(-config.noise..config.noise),
            rng.gen_range(-config.noise..config.noise),
        )
    });
    samples
        .row_mut(config.pulse_sample)
        .mapv_inplace(|value| value + Complex64::new(1.0, 0.0));
    Ok(samples)
}

/// Builds the source stream described by `config`.
pub fn build_source(config: &SourceConfig) -> anyhow::Result<Box<dyn SampleStream>> {
    if config.sidebands.is_empty() {
        bail!("source needs at least one channel");
    }
    if config.pulse_sample >= config.samples {
        bail!(
            "pulse sample {} lies outside a source of {} samples",
            config.pulse_sample,
            config.samples
        );
    }
    if !(config.noise >= 0.0 && config.noise.is_finite()) {
        bail!("noise amplitude {} must be finite and non-negative", config.noise);
    }

    let info = config.stream_info();
    if config.noise > 0.0 {
        let samples = build_noisy_samples(config)?;
        let stream = ArrayStream::new(samples, info).context("building noisy source")?;
        Ok(Box::new(stream))
    } else {
        let stream = impulse_stream(info, config.samples, config.pulse_sample)
            .context("building impulse source")?;
        Ok(Box::new(stream))
    }
}
