use serde::{Deserialize, Serialize};

use crate::prelude::{DispersionError, DispersionResult};
use crate::stream::{SampleKind, Sideband};
use crate::units::Frequency;

/// Frequency to which a filter refers all delays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceFrequency {
    /// Centre of the band spanned by all channels.
    #[default]
    BandCenter,
    /// One frequency for every channel; may lie outside the band.
    Single(Frequency),
    /// One frequency per channel.
    PerChannel(Vec<Frequency>),
}

impl From<Frequency> for ReferenceFrequency {
    fn from(frequency: Frequency) -> Self {
        ReferenceFrequency::Single(frequency)
    }
}

impl From<Option<Frequency>> for ReferenceFrequency {
    fn from(frequency: Option<Frequency>) -> Self {
        frequency.map_or(ReferenceFrequency::BandCenter, ReferenceFrequency::Single)
    }
}

impl From<Vec<Frequency>> for ReferenceFrequency {
    fn from(frequencies: Vec<Frequency>) -> Self {
        ReferenceFrequency::PerChannel(frequencies)
    }
}

/// Sky frequencies occupied by one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelBand {
    pub lower: Frequency,
    pub upper: Frequency,
}

impl ChannelBand {
    /// Complex channels are centred on `frequency`; real channels start at
    /// `frequency` and extend half the sample rate along the sideband.
    pub fn new(
        frequency: Frequency,
        sideband: Sideband,
        sample_rate: Frequency,
        kind: SampleKind,
    ) -> Self {
        let half = sample_rate / 2.0;
        match (kind, sideband) {
            (SampleKind::Complex, _) => Self {
                lower: frequency - half,
                upper: frequency + half,
            },
            (SampleKind::Real, Sideband::Upper) => Self {
                lower: frequency,
                upper: frequency + half,
            },
            (SampleKind::Real, Sideband::Lower) => Self {
                lower: frequency - half,
                upper: frequency,
            },
        }
    }

    pub fn edges(&self) -> [Frequency; 2] {
        [self.lower, self.upper]
    }
}

impl ReferenceFrequency {
    /// One reference frequency per band.
    pub fn resolve(&self, bands: &[ChannelBand]) -> DispersionResult<Vec<Frequency>> {
        let resolved = match self {
            ReferenceFrequency::BandCenter => {
                let (lower, upper) = bands
                    .iter()
                    .map(|band| (band.lower, band.upper))
                    .reduce(|(lo, hi), (l, u)| (lo.min(l), hi.max(u)))
                    .ok_or_else(|| {
                        DispersionError::InvalidQuantity("stream has no channels".into())
                    })?;
                vec![(lower + upper) / 2.0; bands.len()]
            }
            ReferenceFrequency::Single(frequency) => vec![*frequency; bands.len()],
            ReferenceFrequency::PerChannel(frequencies) => {
                if frequencies.len() != bands.len() {
                    return Err(DispersionError::InvalidQuantity(format!(
                        "{} reference frequencies for {} channels",
                        frequencies.len(),
                        bands.len()
                    )));
                }
                frequencies.clone()
            }
        };
        if let Some(bad) = resolved.iter().find(|f| !f.is_physical()) {
            return Err(DispersionError::InvalidQuantity(format!(
                "reference frequency {} must be positive",
                bad
            )));
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands(kind: SampleKind) -> Vec<ChannelBand> {
        let rate = Frequency::from_khz(128.0);
        [Sideband::Upper, Sideband::Lower]
            .iter()
            .map(|&sideband| ChannelBand::new(Frequency::from_mhz(300.0), sideband, rate, kind))
            .collect()
    }

    #[test]
    fn band_center_covers_all_channels() {
        for kind in [SampleKind::Complex, SampleKind::Real] {
            let resolved = ReferenceFrequency::BandCenter.resolve(&bands(kind)).unwrap();
            assert_eq!(resolved, vec![Frequency::from_mhz(300.0); 2]);
        }
        let real = bands(SampleKind::Real);
        assert_eq!(real[0].lower, Frequency::from_mhz(300.0));
        assert_eq!(real[1].lower.hz(), 299_936_000.0);
    }

    #[test]
    fn single_reference_is_broadcast_even_outside_band() {
        let outside = Frequency::from_mhz(300.128);
        let resolved = ReferenceFrequency::from(outside)
            .resolve(&bands(SampleKind::Complex))
            .unwrap();
        assert_eq!(resolved, vec![outside; 2]);
    }

    #[test]
    fn per_channel_reference_must_match_channels() {
        let refs = ReferenceFrequency::from(vec![Frequency::from_mhz(300.0)]);
        assert!(matches!(
            refs.resolve(&bands(SampleKind::Complex)),
            Err(DispersionError::InvalidQuantity(_))
        ));
        let negative = ReferenceFrequency::from(Frequency::from_mhz(-1.0));
        assert!(negative.resolve(&bands(SampleKind::Complex)).is_err());
    }

    #[test]
    fn reference_deserializes_from_null_string_or_list() {
        let centre: ReferenceFrequency = serde_json::from_str("null").unwrap();
        assert_eq!(centre, ReferenceFrequency::BandCenter);
        let single: ReferenceFrequency = serde_json::from_str("\"300 MHz\"").unwrap();
        assert_eq!(single, ReferenceFrequency::Single(Frequency::from_mhz(300.0)));
        let list: ReferenceFrequency = serde_json::from_str("[\"300 MHz\", \"301 MHz\"]").unwrap();
        assert!(matches!(list, ReferenceFrequency::PerChannel(ref v) if v.len() == 2));
    }
}
