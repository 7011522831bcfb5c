use crate::dataset::Dataset;
use crate::engine::MetricsEngine;
use crate::error::DataError;

/// Holds the engine for one interactive analysis session. Loading a new
/// dataset replaces the previous one wholesale; there is no merge and no
/// teardown beyond the replacement itself.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    engine: Option<MetricsEngine>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current dataset. Last write wins.
    pub fn replace(&mut self, dataset: Dataset) {
        self.engine = Some(MetricsEngine::new(dataset));
    }

    /// The engine for the currently loaded dataset.
    pub fn engine(&self) -> Result<&MetricsEngine, DataError> {
        self.engine.as_ref().ok_or(DataError::NoDataset)
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }
}
