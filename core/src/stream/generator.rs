use ndarray::Array2;
use num_complex::Complex64;

use super::{
    check_window, resolve_seek, SampleKind, SampleStream, SeekOffset, Sideband, StreamInfo, Whence,
};
use crate::prelude::{DispersionError, DispersionResult};
use crate::units::{Frequency, Time};

/// Stream whose samples are produced on demand.
///
/// `source(start, count)` must return the `(count, channels)` block
/// starting at sample `start`, and the same block for the same arguments.
pub struct StreamGenerator<F> {
    source: F,
    info: StreamInfo,
    len: usize,
    offset: usize,
}

impl<F> StreamGenerator<F>
where
    F: Fn(usize, usize) -> Array2<Complex64>,
{
    pub fn new(source: F, len: usize, info: StreamInfo) -> DispersionResult<Self> {
        info.validate(info.n_channels())?;
        Ok(Self {
            source,
            info,
            len,
            offset: 0,
        })
    }
}

/// Unit impulse at sample `at` in every channel, zero elsewhere.
pub fn impulse_stream(
    info: StreamInfo,
    len: usize,
    at: usize,
) -> DispersionResult<StreamGenerator<impl Fn(usize, usize) -> Array2<Complex64>>> {
    let channels = info.n_channels();
    let source = move |start: usize, count: usize| {
        let mut block = Array2::zeros((count, channels));
        if (start..start + count).contains(&at) {
            block.row_mut(at - start).fill(Complex64::new(1.0, 0.0));
        }
        block
    };
    StreamGenerator::new(source, len, info)
}

impl<F> SampleStream for StreamGenerator<F>
where
    F: Fn(usize, usize) -> Array2<Complex64>,
{
    fn shape(&self) -> (usize, usize) {
        (self.len, self.info.n_channels())
    }

    fn sample_rate(&self) -> Frequency {
        self.info.sample_rate
    }

    fn frequency(&self) -> &[Frequency] {
        &self.info.frequency
    }

    fn sideband(&self) -> &[Sideband] {
        &self.info.sideband
    }

    fn start_time(&self) -> Time {
        self.info.start_time
    }

    fn samples_per_frame(&self) -> usize {
        self.info.samples_per_frame
    }

    fn kind(&self) -> SampleKind {
        self.info.kind
    }

    fn tell(&self) -> usize {
        self.offset
    }

    fn seek(&mut self, offset: SeekOffset, whence: Whence) -> DispersionResult<usize> {
        self.offset = resolve_seek(
            offset,
            whence,
            self.offset,
            self.len,
            self.info.start_time,
            self.info.sample_rate,
        )?;
        Ok(self.offset)
    }

    fn read(&mut self, count: usize) -> DispersionResult<Array2<Complex64>> {
        check_window(self.offset, count, self.len)?;
        let mut block = (self.source)(self.offset, count);
        let expected = (count, self.info.n_channels());
        if block.dim() != expected {
            return Err(DispersionError::Stream(format!(
                "generator returned {:?} samples, expected {:?}",
                block.dim(),
                expected
            )));
        }
        if self.info.kind == SampleKind::Real {
            block.mapv_inplace(|value| Complex64::new(value.re, 0.0));
        }
        self.offset += count;
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> StreamInfo {
        let start = Time::from_unix(0);
        StreamInfo::new(Frequency::from_khz(128.0), start, Frequency::from_mhz(300.0), 2)
            .with_sidebands(vec![Sideband::Upper, Sideband::Lower])
            .with_samples_per_frame(1000)
    }

    #[test]
    fn impulse_stream_places_single_unit_sample() {
        let mut stream = impulse_stream(info(), 5000, 3210).unwrap();
        let data = stream.read_remaining().unwrap();
        assert_eq!(data.dim(), (5000, 2));
        for ((i, _), value) in data.indexed_iter() {
            let expected = if i == 3210 { 1.0 } else { 0.0 };
            assert_eq!(*value, Complex64::new(expected, 0.0));
        }
    }

    #[test]
    fn generator_checks_block_shape() {
        let narrow = |_: usize, count: usize| Array2::<Complex64>::zeros((count, 1));
        let mut stream = StreamGenerator::new(narrow, 100, info()).unwrap();
        assert!(matches!(stream.read(10), Err(DispersionError::Stream(_))));
        assert_eq!(stream.tell(), 0);
    }
}
