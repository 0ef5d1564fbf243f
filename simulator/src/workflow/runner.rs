use anyhow::{bail, Context};
use dispcore::math::StatsHelper;
use dispcore::processing::ChannelBand;
use dispcore::units::{Frequency, Time};
use dispcore::{
    Dedisperse, Disperse, DispersionMeasure, ReferenceFrequency, SampleStream, SeekOffset, Whence,
};
use serde::Serialize;

use crate::generator::profile::build_source;
use crate::workflow::config::{FilterKind, WorkflowConfig};

/// Summary of one chain run over the configured window.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub chain: Vec<FilterKind>,
    pub dm: DispersionMeasure,
    /// Reference frequency resolved by each stage.
    pub reference_frequency: Vec<Vec<Frequency>>,
    pub start_time: Time,
    pub samples_per_frame: usize,
    pub window_center: Time,
    /// Binned power, one row per channel.
    pub bin_power: Vec<Vec<f64>>,
    pub peak_bins: Vec<usize>,
    /// Share of each channel's window energy in its peak bin.
    pub peak_fraction: Vec<f64>,
    pub rms: Vec<f64>,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Stacks the configured stages on the source.
    fn build_chain(&self) -> anyhow::Result<(Box<dyn SampleStream>, Vec<Vec<Frequency>>)> {
        let mut stream = build_source(&self.config.source)?;
        let mut references = Vec::with_capacity(self.config.chain.len());
        for (index, kind) in self.config.chain.iter().enumerate() {
            let options = self.config.filter_options();
            stream = match kind {
                FilterKind::Disperse => {
                    let stage = Disperse::with_options(stream, self.config.dm, options)
                        .with_context(|| format!("building stage {} ({})", index, kind))?;
                    references.push(stage.reference_frequency().to_vec());
                    Box::new(stage)
                }
                FilterKind::Dedisperse => {
                    let stage = Dedisperse::with_options(stream, self.config.dm, options)
                        .with_context(|| format!("building stage {} ({})", index, kind))?;
                    references.push(stage.reference_frequency().to_vec());
                    Box::new(stage)
                }
            };
        }
        Ok((stream, references))
    }

    /// Centre of the window, following the source band centre through the
    /// chain when aligned.
    fn window_center(&self, references: &[Vec<Frequency>]) -> anyhow::Result<Time> {
        let source = &self.config.source;
        let mut center = source.start_time + self.config.window.center;
        if self.config.window.align_to_reference {
            let bands: Vec<ChannelBand> = source
                .sidebands
                .iter()
                .map(|&sideband| {
                    ChannelBand::new(source.frequency, sideband, source.sample_rate, source.kind())
                })
                .collect();
            let band_center = ReferenceFrequency::BandCenter
                .resolve(&bands)
                .context("resolving source band centre")?[0];
            for (kind, reference) in self.config.chain.iter().zip(references) {
                let delay = self.config.dm.time_delay(band_center, reference[0]);
                center = center + delay * kind.sign();
            }
        }
        Ok(center)
    }

    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let window = &self.config.window;
        if window.bins == 0 || window.samples < window.bins {
            bail!("window of {} samples cannot be split into {} bins", window.samples, window.bins);
        }

        let (mut stream, references) = self.build_chain()?;
        let window_center = self.window_center(&references)?;
        log::info!(
            "chain {:?} with {} -> {} samples starting {}",
            self.config.chain,
            self.config.dm,
            stream.len(),
            stream.start_time()
        );

        stream
            .seek(SeekOffset::Time(window_center), Whence::Start)
            .context("seeking window centre")?;
        stream
            .seek(SeekOffset::Samples(-((window.samples / 2) as i64)), Whence::Current)
            .context("seeking window start")?;
        let samples = stream.read(window.samples).context("reading window")?;

        let power = StatsHelper::binned_power(samples.view(), window.samples / window.bins);
        let peak_bins = StatsHelper::peak_bins(power.view());
        let bin_power: Vec<Vec<f64>> =
            power.columns().into_iter().map(|column| column.to_vec()).collect();
        let peak_fraction = bin_power
            .iter()
            .zip(&peak_bins)
            .map(|(column, &peak)| {
                let total: f64 = column.iter().sum();
                if total > 0.0 {
                    column[peak] / total
                } else {
                    0.0
                }
            })
            .collect();
        let rms = samples
            .columns()
            .into_iter()
            .map(|column| StatsHelper::rms(&column.to_vec()))
            .collect();

        Ok(WorkflowResult {
            chain: self.config.chain.clone(),
            dm: self.config.dm,
            reference_frequency: references,
            start_time: stream.start_time(),
            samples_per_frame: stream.samples_per_frame(),
            window_center,
            bin_power,
            peak_bins,
            peak_fraction,
            rms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::default_dm;

    #[test]
    fn runner_localizes_dispersed_pulse() {
        let chain = vec![FilterKind::Disperse];
        let cfg = WorkflowConfig::from_args(default_dm().unwrap(), None, chain);
        let result = Runner::new(cfg).execute().unwrap();
        assert_eq!(result.reference_frequency, vec![vec![Frequency::from_mhz(300.0); 2]]);
        assert_eq!(result.bin_power.len(), 2);
        for column in &result.bin_power {
            assert_eq!(column.len(), 20);
            let total: f64 = column.iter().sum();
            assert!((column[9] + column[10]) / total > 0.99);
        }
    }

    #[test]
    fn runner_round_trip_restores_impulse() {
        let chain = vec![FilterKind::Disperse, FilterKind::Dedisperse];
        let cfg = WorkflowConfig::from_args(default_dm().unwrap(), None, chain);
        let result = Runner::new(cfg.clone()).execute().unwrap();
        assert_eq!(result.peak_bins, vec![10, 10]);
        for fraction in &result.peak_fraction {
            assert!(*fraction > 0.99);
        }
        let offset = (result.window_center - cfg.source.start_time).samples(cfg.source.sample_rate);
        assert_eq!(offset.round() as usize, cfg.source.pulse_sample);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"dedisperse\""));
    }

    #[test]
    fn runner_rejects_empty_window() {
        let mut cfg = WorkflowConfig::from_args(default_dm().unwrap(), None, Vec::new());
        cfg.window.bins = 0;
        assert!(Runner::new(cfg).execute().is_err());
    }
}
