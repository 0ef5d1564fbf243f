use ndarray::{s, Array2, ArrayView2};
use num_complex::Complex64;

pub struct StatsHelper;

impl StatsHelper {
    pub fn rms(samples: &[Complex64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|v| v.norm_sqr()).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    /// Power summed over consecutive runs of `bin` samples, per channel.
    /// A trailing partial run is dropped.
    pub fn binned_power(data: ArrayView2<Complex64>, bin: usize) -> Array2<f64> {
        let (samples, channels) = data.dim();
        let bins = if bin == 0 { 0 } else { samples / bin };
        let mut power = Array2::zeros((bins, channels));
        for b in 0..bins {
            let block = data.slice(s![b * bin..(b + 1) * bin, ..]);
            for (c, column) in block.columns().into_iter().enumerate() {
                power[[b, c]] = column.iter().map(|v| v.norm_sqr()).sum();
            }
        }
        power
    }

    /// Index of the largest value in each column.
    pub fn peak_bins(power: ArrayView2<f64>) -> Vec<usize> {
        power
            .columns()
            .into_iter()
            .map(|column| {
                column
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (i, &p)| {
                        if p > best.1 {
                            (i, p)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect()
    }
}
