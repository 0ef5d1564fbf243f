pub mod dispersion;
pub mod kernel;
pub mod reference;

pub use dispersion::{Dedisperse, Disperse};
pub use kernel::{DelaySpan, FrameLayout, PhaseKernel};
pub use reference::{ChannelBand, ReferenceFrequency};
