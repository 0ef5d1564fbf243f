use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use dispcore::units::{Frequency, TimeDelta};
use dispcore::{DispersionMeasure, FilterOptions, ReferenceFrequency};
use serde::{Deserialize, Serialize};

use crate::generator::profile::SourceConfig;

/// One filter stage of the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Disperse,
    Dedisperse,
}

impl FilterKind {
    /// `+1` when the stage adds the dispersion delay, `-1` when it removes it.
    pub fn sign(self) -> f64 {
        match self {
            FilterKind::Disperse => 1.0,
            FilterKind::Dedisperse => -1.0,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Disperse => write!(f, "disperse"),
            FilterKind::Dedisperse => write!(f, "dedisperse"),
        }
    }
}

/// Window of the chain output that is binned and reported.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Offset of the window centre from the source start.
    pub center: TimeDelta,
    /// Shift the centre by the net delay of the source band centre.
    pub align_to_reference: bool,
    pub samples: usize,
    pub bins: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            center: TimeDelta::from_seconds(0.5),
            align_to_reference: true,
            samples: 64_000,
            bins: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub source: SourceConfig,
    pub dm: DispersionMeasure,
    #[serde(default)]
    pub reference_frequency: ReferenceFrequency,
    #[serde(default)]
    pub frame_size: Option<usize>,
    #[serde(default = "default_chain")]
    pub chain: Vec<FilterKind>,
    #[serde(default)]
    pub window: WindowConfig,
}

fn default_chain() -> Vec<FilterKind> {
    vec![FilterKind::Disperse]
}

/// Measure that spreads the default source band over 0.05 s.
pub fn default_dm() -> anyhow::Result<DispersionMeasure> {
    DispersionMeasure::new(1000.0 * 0.05 / 0.039342251)
        .context("building default dispersion measure")
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        dm: DispersionMeasure,
        reference_frequency: Option<Frequency>,
        chain: Vec<FilterKind>,
    ) -> Self {
        let mut config = Self {
            source: SourceConfig::default(),
            dm,
            reference_frequency: ReferenceFrequency::BandCenter,
            frame_size: None,
            chain: default_chain(),
            window: WindowConfig::default(),
        };
        config.apply_overrides(None, reference_frequency, chain);
        config
    }

    /// Command-line values take precedence over the loaded file.
    pub fn apply_overrides(
        &mut self,
        dm: Option<DispersionMeasure>,
        reference_frequency: Option<Frequency>,
        chain: Vec<FilterKind>,
    ) {
        if let Some(dm) = dm {
            self.dm = dm;
        }
        if let Some(frequency) = reference_frequency {
            self.reference_frequency = ReferenceFrequency::Single(frequency);
        }
        if !chain.is_empty() {
            self.chain = chain;
        }
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            reference_frequency: self.reference_frequency.clone(),
            frame_size: self.frame_size,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispcore::Sideband;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_uses_defaults() {
        let cfg = WorkflowConfig::from_args(default_dm().unwrap(), None, Vec::new());
        assert_eq!(cfg.chain, vec![FilterKind::Disperse]);
        assert_eq!(cfg.filter_options(), FilterOptions::default());
        assert_eq!(cfg.window.bins, 20);
        assert_eq!(cfg.source.samples, 164_000);
    }

    #[test]
    fn config_overrides_replace_loaded_values() {
        let mut cfg = WorkflowConfig::from_args(default_dm().unwrap(), None, Vec::new());
        cfg.apply_overrides(
            Some(-default_dm().unwrap()),
            Some(Frequency::from_mhz(300.064)),
            vec![FilterKind::Disperse, FilterKind::Dedisperse],
        );
        assert_eq!(cfg.dm, -default_dm().unwrap());
        assert_eq!(cfg.chain.len(), 2);
        assert_eq!(
            cfg.filter_options().reference_frequency,
            ReferenceFrequency::Single(Frequency::from_mhz(300.064))
        );
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        let yaml = "\
source:
  sample_rate: 128 kHz
  frequency: 300 MHz
  sidebands: [upper, lower]
  complex: false
  start_time: 2010-11-12T13:14:15
  samples: 164000
  pulse_sample: 64000
dm: 1270.9 pc/cm3
reference_frequency: 300 MHz
chain: [disperse, dedisperse]
window:
  center: 0.5 s
  samples: 64000
";
        temp.write_all(yaml.as_bytes()).unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert!((cfg.dm.value() - 1270.9).abs() < 1e-9);
        assert!(!cfg.source.complex);
        assert_eq!(cfg.source.sidebands, vec![Sideband::Upper, Sideband::Lower]);
        assert_eq!(cfg.source.start_time, SourceConfig::default().start_time);
        assert_eq!(
            cfg.reference_frequency,
            ReferenceFrequency::Single(Frequency::from_mhz(300.0))
        );
        assert_eq!(cfg.chain, vec![FilterKind::Disperse, FilterKind::Dedisperse]);
        assert!(cfg.window.align_to_reference);
        assert_eq!(cfg.frame_size, None);
    }

    #[test]
    fn config_load_rejects_wrong_units() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"dm: 1270.9 MHz\n").unwrap();
        let path = temp.into_temp_path();
        assert!(WorkflowConfig::load(&path).is_err());
    }
}
