pub mod measure;

pub use measure::{DispersionMeasure, DISPERSION_DELAY_CONSTANT};
