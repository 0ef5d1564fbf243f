pub mod fft;
pub mod freq;
pub mod stats;

pub use fft::FftHelper;
pub use freq::{baseband_frequencies, next_fast_len};
pub use stats::StatsHelper;
