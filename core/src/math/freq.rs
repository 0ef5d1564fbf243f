use crate::stream::SampleKind;
use crate::units::Frequency;

/// Baseband frequency of every bin of an `n`-point transform of samples
/// taken at `sample_rate`.
///
/// Complex data uses the full transform order (`0, 1, ..., -2, -1` times
/// `rate / n`); real data only the `n / 2 + 1` non-negative bins.
pub fn baseband_frequencies(n: usize, sample_rate: Frequency, kind: SampleKind) -> Vec<Frequency> {
    let step = sample_rate.hz() / n as f64;
    match kind {
        SampleKind::Complex => {
            let positive = (n + 1) / 2;
            (0..n)
                .map(|k| {
                    let signed = if k < positive { k as f64 } else { k as f64 - n as f64 };
                    Frequency::from_hz(signed * step)
                })
                .collect()
        }
        SampleKind::Real => (0..=n / 2).map(|k| Frequency::from_hz(k as f64 * step)).collect(),
    }
}

/// Smallest power of two not below `n` (and at least 1).
pub fn next_fast_len(n: usize) -> usize {
    n.max(1).next_power_of_two()
}
