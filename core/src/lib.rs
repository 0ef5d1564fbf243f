//! Coherent dispersion and dedispersion of streamed radio baseband data.
//!
//! A [`DispersionMeasure`] models the frequency-dependent delay of the
//! interstellar medium; [`Disperse`] and [`Dedisperse`] apply it as an
//! overlap-save Fourier filter to any [`SampleStream`] while keeping the
//! stream seekable.

pub mod dispersion;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod stream;
pub mod telemetry;
pub mod units;

pub use dispersion::DispersionMeasure;
pub use prelude::{DispersionError, DispersionResult, FilterOptions};
pub use processing::{Dedisperse, Disperse, ReferenceFrequency};
pub use stream::{SampleKind, SampleStream, SeekOffset, Sideband, Whence};
