use ndarray::{s, Array2};
use num_complex::Complex64;

use super::{
    check_window, resolve_seek, SampleKind, SampleStream, SeekOffset, Sideband, StreamInfo, Whence,
};
use crate::prelude::DispersionResult;
use crate::units::{Frequency, Time};

/// Stream over samples held in memory.
#[derive(Debug, Clone)]
pub struct ArrayStream {
    data: Array2<Complex64>,
    info: StreamInfo,
    offset: usize,
}

impl ArrayStream {
    /// Wraps `data` shaped `(samples, channels)`. Imaginary parts are
    /// dropped for real streams.
    pub fn new(mut data: Array2<Complex64>, info: StreamInfo) -> DispersionResult<Self> {
        info.validate(data.ncols())?;
        if info.kind == SampleKind::Real {
            data.mapv_inplace(|value| Complex64::new(value.re, 0.0));
        }
        Ok(Self {
            data,
            info,
            offset: 0,
        })
    }


    pub fn into_inner(self) -> Array2<Complex64> {
        self.data
    }
}

impl SampleStream for ArrayStream {
    fn shape(&self) -> (usize, usize) {
        self.data.dim()
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
            self.len(),
            self.info.start_time,
            self.info.sample_rate,
        )?;
        Ok(self.offset)
    }

    fn read(&mut self, count: usize) -> DispersionResult<Array2<Complex64>> {
        check_window(self.offset, count, self.len())?;
        let block = self
            .data
            .slice(s![self.offset..self.offset + count, ..])
            .to_owned();
        self.offset += count;
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::DispersionError;

    fn info(channels: usize) -> StreamInfo {
        let start = Time::from_unix(0);
        StreamInfo::new(Frequency::from_khz(1.0), start, Frequency::from_mhz(300.0), channels)
    }

    fn ramp_stream(kind: SampleKind) -> ArrayStream {
        let data = Array2::from_shape_fn((16, 2), |(i, c)| {
            Complex64::new(i as f64, c as f64 + 1.0)
        });
        let info = info(2).with_kind(kind);
        ArrayStream::new(data, info).unwrap()
    }

    #[test]
    fn array_stream_reads_and_advances() {
        let mut stream = ramp_stream(SampleKind::Complex);
        stream.seek(SeekOffset::Samples(4), Whence::Start).unwrap();
        let block = stream.read(3).unwrap();
        assert_eq!(block.dim(), (3, 2));
        assert_eq!(block[[0, 1]], Complex64::new(4.0, 2.0));
        assert_eq!(stream.tell(), 7);
        assert_eq!(stream.read_remaining().unwrap().nrows(), 9);
    }

    #[test]
    fn array_stream_rejects_reads_past_end_without_moving() {
        let mut stream = ramp_stream(SampleKind::Complex);
        stream.seek(SeekOffset::Samples(-2), Whence::End).unwrap();
        assert!(matches!(stream.read(3), Err(DispersionError::OutOfBounds { .. })));
        assert_eq!(stream.tell(), 14);
    }

    #[test]
    fn real_array_stream_has_no_imaginary_part() {
        let mut stream = ramp_stream(SampleKind::Real);
        assert!(stream.read(16).unwrap().iter().all(|v| v.im == 0.0));
    }

    #[test]
    fn array_stream_validates_channel_metadata() {
        let data = Array2::zeros((4, 3));
        let info = info(2);
        assert!(ArrayStream::new(data, info).is_err());
    }
}
