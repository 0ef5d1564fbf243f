//! Coherent dispersion and dedispersion as stream decorators.
//!
//! Output frames are aligned in output sample index: frame `k` covers
//! output samples `[k M, (k + 1) M)` and is filtered from wrapped samples
//! `[k M, k M + N)`. Samples past the last whole frame come from a tail
//! frame that ends at the end of the wrapped stream. Every output sample is
//! thus a function of its index only, whatever the seek/read pattern.

use ndarray::{s, Array2};
use num_complex::Complex64;

use super::kernel::{DelaySpan, FrameLayout, PhaseKernel};
use super::reference::ChannelBand;
use crate::dispersion::DispersionMeasure;
use crate::math::fft::FftHelper;
use crate::prelude::{DispersionError, DispersionResult, FilterOptions};
use crate::stream::{
    check_window, resolve_seek, SampleKind, SampleStream, SeekOffset, Sideband, Whence,
};
use crate::telemetry::log::LogManager;
use crate::units::{Frequency, Time};

/// Coherently disperse a stream: delay each frequency by its dispersion
/// delay relative to the reference frequency.
///
/// The output starts `lead` samples after the wrapped stream, where `lead`
/// is the delay of the lowest frequency rounded up, and is shorter than it
/// by the padding.
pub struct Disperse<S> {
    inner: S,
    dm: DispersionMeasure,
    frequency: Vec<Frequency>,
    sideband: Vec<Sideband>,
    reference_frequency: Vec<Frequency>,
    layout: FrameLayout,
    kernel: PhaseKernel,
    transform: FftHelper,
    start_time: Time,
    len: usize,
    offset: usize,
    logger: LogManager,
}

impl<S: SampleStream> Disperse<S> {
    pub fn new(inner: S, dm: DispersionMeasure) -> DispersionResult<Self> {
        Self::with_options(inner, dm, FilterOptions::default())
    }

    pub fn with_options(
        inner: S,
        dm: DispersionMeasure,
        options: FilterOptions,
    ) -> DispersionResult<Self> {
        Self::build(inner, dm, options, LogManager::new("disperse"))
    }

    fn build(
        inner: S,
        dm: DispersionMeasure,
        options: FilterOptions,
        logger: LogManager,
    ) -> DispersionResult<Self> {
        let channels = inner.n_channels();
        if channels == 0 {
            return Err(DispersionError::Construction("wrapped stream has no channels".into()));
        }
        let frequency = per_channel(options.frequency, inner.frequency(), channels, "frequencies")?;
        let sideband = per_channel(options.sideband, inner.sideband(), channels, "sidebands")?;
        if let Some(bad) = frequency.iter().find(|f| !f.is_physical()) {
            return Err(DispersionError::InvalidQuantity(format!(
                "channel frequency {} must be positive",
                bad
            )));
        }
        let sample_rate = inner.sample_rate();
        let kind = inner.kind();

        let bands: Vec<ChannelBand> = frequency
            .iter()
            .zip(&sideband)
            .map(|(&centre, &sideband)| ChannelBand::new(centre, sideband, sample_rate, kind))
            .collect();
        let reference_frequency = options.reference_frequency.resolve(&bands)?;
        let span = DelaySpan::across(dm, &bands, &reference_frequency);
        let layout = FrameLayout::new(
            span,
            sample_rate,
            options.frame_size,
            inner.samples_per_frame(),
            inner.len(),
        )?;
        let kernel = PhaseKernel::build(
            dm,
            &frequency,
            &sideband,
            &reference_frequency,
            sample_rate,
            kind,
            &layout,
        );
        let transform = FftHelper::new(layout.frame_size, kind);
        let start_time = inner.start_time() + layout.start_offset(sample_rate);
        let len = inner.len() - layout.padding();

        logger.record(&format!(
            "{} reference {} padding {} frame {} -> {} samples per frame",
            dm,
            reference_frequency[0],
            layout.padding(),
            layout.frame_size,
            layout.samples_per_frame()
        ));

        Ok(Self {
            inner,
            dm,
            frequency,
            sideband,
            reference_frequency,
            layout,
            kernel,
            transform,
            start_time,
            len,
            offset: 0,
            logger,
        })
    }

    pub fn dm(&self) -> DispersionMeasure {
        self.dm
    }

    /// Resolved reference frequency, one per channel.
    pub fn reference_frequency(&self) -> &[Frequency] {
        &self.reference_frequency
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn padding(&self) -> usize {
        self.layout.padding()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// First output sample of the frame holding output sample `index`.
    fn frame_start(&self, index: usize) -> usize {
        let per_frame = self.layout.samples_per_frame();
        let whole = self.len / per_frame * per_frame;
        if index < whole {
            index / per_frame * per_frame
        } else {
            self.len - per_frame
        }
    }

    /// Filters the frame whose output starts at `start`.
    fn filter_frame(&mut self, start: usize) -> DispersionResult<Array2<Complex64>> {
        self.inner.seek(SeekOffset::Samples(start as i64), Whence::Start)?;
        let mut frame = self.inner.read(self.layout.frame_size)?;
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.layout.frame_size];
        for (c, mut column) in frame.columns_mut().into_iter().enumerate() {
            for (slot, value) in buffer.iter_mut().zip(column.iter()) {
                *slot = *value;
            }
            self.transform.convolve(&mut buffer, self.kernel.channel(c))?;
            for (value, filtered) in column.iter_mut().zip(&buffer) {
                *value = *filtered;
            }
        }
        self.logger.detail(&format!("filtered frame at output sample {}", start));
        Ok(frame.slice_move(s![..self.layout.samples_per_frame(), ..]))
    }
}

fn per_channel<T: Clone>(
    overridden: Option<Vec<T>>,
    inherited: &[T],
    channels: usize,
    what: &str,
) -> DispersionResult<Vec<T>> {
    let values = overridden.unwrap_or_else(|| inherited.to_vec());
    if values.len() != channels {
        return Err(DispersionError::InvalidQuantity(format!(
            "{} {} for {} channels",
            values.len(),
            what,
            channels
        )));
    }
    Ok(values)
}

impl<S: SampleStream> SampleStream for Disperse<S> {
    fn shape(&self) -> (usize, usize) {
        (self.len, self.frequency.len())
    }

    fn sample_rate(&self) -> Frequency {
        self.inner.sample_rate()
    }

    fn frequency(&self) -> &[Frequency] {
        &self.frequency
    }

    fn sideband(&self) -> &[Sideband] {
        &self.sideband
    }

    fn start_time(&self) -> Time {
        self.start_time
    }

    fn samples_per_frame(&self) -> usize {
        self.layout.samples_per_frame()
    }

    fn kind(&self) -> SampleKind {
        self.inner.kind()
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
            self.start_time,
            self.inner.sample_rate(),
        )?;
        Ok(self.offset)
    }

    fn read(&mut self, count: usize) -> DispersionResult<Array2<Complex64>> {
        check_window(self.offset, count, self.len)?;
        let end = self.offset + count;
        let mut output = Array2::zeros((count, self.n_channels()));
        let mut position = self.offset;
        while position < end {
            let start = self.frame_start(position);
            let stop = (start + self.layout.samples_per_frame()).min(end);
            let frame = self.filter_frame(start)?;
            output
                .slice_mut(s![position - self.offset..stop - self.offset, ..])
                .assign(&frame.slice(s![position - start..stop - start, ..]));
            position = stop;
        }
        self.offset = end;
        Ok(output)
    }
}

/// Coherently dedisperse a stream: the inverse of [`Disperse`] for the same
/// measure and reference frequency.
///
/// Acts as `Disperse` with the measure negated, so the output starts at the
/// (negated) delay of the highest frequency.
pub struct Dedisperse<S> {
    filter: Disperse<S>,
    dm: DispersionMeasure,
}

impl<S: SampleStream> Dedisperse<S> {
    pub fn new(inner: S, dm: DispersionMeasure) -> DispersionResult<Self> {
        Self::with_options(inner, dm, FilterOptions::default())
    }

    pub fn with_options(
        inner: S,
        dm: DispersionMeasure,
        options: FilterOptions,
    ) -> DispersionResult<Self> {
        let filter = Disperse::build(inner, -dm, options, LogManager::new("dedisperse"))?;
        Ok(Self { filter, dm })
    }

    pub fn dm(&self) -> DispersionMeasure {
        self.dm
    }

    pub fn reference_frequency(&self) -> &[Frequency] {
        self.filter.reference_frequency()
    }

    pub fn layout(&self) -> &FrameLayout {
        self.filter.layout()
    }

    pub fn padding(&self) -> usize {
        self.filter.padding()
    }

    pub fn inner(&self) -> &S {
        self.filter.inner()
    }

    pub fn into_inner(self) -> S {
        self.filter.into_inner()
    }
}

impl<S: SampleStream> SampleStream for Dedisperse<S> {
    fn shape(&self) -> (usize, usize) {
        self.filter.shape()
    }

    fn sample_rate(&self) -> Frequency {
        self.filter.sample_rate()
    }

    fn frequency(&self) -> &[Frequency] {
        self.filter.frequency()
    }

    fn sideband(&self) -> &[Sideband] {
        self.filter.sideband()
    }

    fn start_time(&self) -> Time {
        self.filter.start_time()
    }

    fn samples_per_frame(&self) -> usize {
        self.filter.samples_per_frame()
    }

    fn kind(&self) -> SampleKind {
        self.filter.kind()
    }

    fn tell(&self) -> usize {
        self.filter.tell()
    }

    fn seek(&mut self, offset: SeekOffset, whence: Whence) -> DispersionResult<usize> {
        self.filter.seek(offset, whence)
    }

    fn read(&mut self, count: usize) -> DispersionResult<Array2<Complex64>> {
        self.filter.read(count)
    }
}
