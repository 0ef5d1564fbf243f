use log::{debug, info};

/// Labelled logging facade used by the filters.
#[derive(Debug, Clone)]
pub struct LogManager {
    label: &'static str,
}

impl LogManager {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }

    pub fn record(&self, message: &str) {
        info!("{}: {}", self.label, message);
    }

    pub fn detail(&self, message: &str) {
        debug!("{}: {}", self.label, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("dispcore")
    }
}
