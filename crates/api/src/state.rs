use std::path::PathBuf;
use std::sync::Arc;

use metrics_engine::AnalysisSession;
use tokio::sync::RwLock;

/// Shared application state: one analysis session per running server,
/// replaced wholesale on every successful load (last write wins).
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<AnalysisSession>>,
    pub upload_dir: PathBuf,
    pub sample_data: PathBuf,
}

impl AppState {
    pub fn new(upload_dir: impl Into<PathBuf>, sample_data: impl Into<PathBuf>) -> Self {
        Self {
            session: Arc::new(RwLock::new(AnalysisSession::new())),
            upload_dir: upload_dir.into(),
            sample_data: sample_data.into(),
        }
    }

    /// Reads `UPLOAD_DIR` and `SAMPLE_DATA` from the environment, with the
    /// repository defaults.
    pub fn from_env() -> Self {
        let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        let sample_data = std::env::var("SAMPLE_DATA")
            .unwrap_or_else(|_| "data/financial_data.csv".to_string());
        Self::new(upload_dir, sample_data)
    }
}
