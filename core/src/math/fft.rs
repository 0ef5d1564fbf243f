use std::sync::Arc;

use num_complex::Complex64;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

use crate::prelude::{DispersionError, DispersionResult};
use crate::stream::SampleKind;

enum Plan {
    Complex {
        forward: Arc<dyn Fft<f64>>,
        inverse: Arc<dyn Fft<f64>>,
    },
    Real {
        forward: Arc<dyn RealToComplex<f64>>,
        inverse: Arc<dyn ComplexToReal<f64>>,
    },
}

/// Helper that wraps the `rustfft`/`realfft` planners for one frame length.
pub struct FftHelper {
    len: usize,
    plan: Plan,
}

impl FftHelper {
    pub fn new(len: usize, kind: SampleKind) -> Self {
        let plan = match kind {
            SampleKind::Complex => {
                let mut planner = FftPlanner::new();
                Plan::Complex {
                    forward: planner.plan_fft_forward(len),
                    inverse: planner.plan_fft_inverse(len),
                }
            }
            SampleKind::Real => {
                let mut planner = RealFftPlanner::new();
                Plan::Real {
                    forward: planner.plan_fft_forward(len),
                    inverse: planner.plan_fft_inverse(len),
                }
            }
        };
        Self { len, plan }
    }

    /// Number of spectral bins a kernel must provide.
    pub fn spectrum_len(&self) -> usize {
        match self.plan {
            Plan::Complex { .. } => self.len,
            Plan::Real { .. } => self.len / 2 + 1,
        }
    }

    /// Circularly convolves `samples` with the filter whose spectrum is
    /// `kernel`: forward transform, multiply, normalized inverse transform.
    pub fn convolve(
        &self,
        samples: &mut [Complex64],
        kernel: &[Complex64],
    ) -> DispersionResult<()> {
        if samples.len() != self.len || kernel.len() != self.spectrum_len() {
            return Err(DispersionError::Fft(format!(
                "frame of {} samples and kernel of {} bins do not match a {}-point transform",
                samples.len(),
                kernel.len(),
                self.len
            )));
        }
        let scale = 1.0 / self.len as f64;
        match &self.plan {
            Plan::Complex { forward, inverse } => {
                forward.process(samples);
                for (value, &gain) in samples.iter_mut().zip(kernel) {
                    *value *= gain;
                }
                inverse.process(samples);
                for value in samples.iter_mut() {
                    *value *= scale;
                }
            }
            Plan::Real { forward, inverse } => {
                let mut input: Vec<f64> = samples.iter().map(|value| value.re).collect();
                let mut spectrum = forward.make_output_vec();
                forward
                    .process(&mut input, &mut spectrum)
                    .map_err(|err| DispersionError::Fft(err.to_string()))?;
                for (value, &gain) in spectrum.iter_mut().zip(kernel) {
                    *value *= gain;
                }
                // DC and Nyquist bins of a real signal carry no imaginary part.
                spectrum[0].im = 0.0;
                if self.len % 2 == 0 {
                    let last = spectrum.len() - 1;
                    spectrum[last].im = 0.0;
                }
                let mut output = inverse.make_output_vec();
                inverse
                    .process(&mut spectrum, &mut output)
                    .map_err(|err| DispersionError::Fft(err.to_string()))?;
                for (value, &real) in samples.iter_mut().zip(&output) {
                    *value = Complex64::new(real * scale, 0.0);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_kernel_returns_input() {
        for kind in [SampleKind::Complex, SampleKind::Real] {
            let helper = FftHelper::new(8, kind);
            let input: Vec<Complex64> = (0..8)
                .map(|i| match kind {
                    SampleKind::Complex => Complex64::new(i as f64, -(i as f64)),
                    SampleKind::Real => Complex64::new(i as f64, 0.0),
                })
                .collect();
            let mut samples = input.clone();
            let kernel = vec![Complex64::new(1.0, 0.0); helper.spectrum_len()];
            helper.convolve(&mut samples, &kernel).unwrap();
            for (got, want) in samples.iter().zip(&input) {
                assert!((got - want).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn linear_phase_kernel_shifts_circularly() {
        let helper = FftHelper::new(8, SampleKind::Complex);
        let mut samples = vec![Complex64::new(0.0, 0.0); 8];
        samples[2] = Complex64::new(1.0, 0.0);
        // exp(-2 pi i k / N) delays by one sample.
        let kernel: Vec<Complex64> = (0..8)
            .map(|k| Complex64::from_polar(1.0, -std::f64::consts::TAU * k as f64 / 8.0))
            .collect();
        helper.convolve(&mut samples, &kernel).unwrap();
        assert!((samples[3] - Complex64::new(1.0, 0.0)).norm() < 1e-12);
        assert!(samples[2].norm() < 1e-12);
    }

    #[test]
    fn mismatched_kernel_is_rejected() {
        let helper = FftHelper::new(8, SampleKind::Real);
        assert_eq!(helper.spectrum_len(), 5);
        let mut samples = vec![Complex64::new(0.0, 0.0); 8];
        let kernel = vec![Complex64::new(1.0, 0.0); 8];
        assert!(matches!(
            helper.convolve(&mut samples, &kernel),
            Err(DispersionError::Fft(_))
        ));
    }
}
