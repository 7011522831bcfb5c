pub mod dataset;
pub mod engine;
pub mod error;
pub mod session;

pub use dataset::{load_csv, load_csv_path, Dataset};
pub use engine::MetricsEngine;
pub use error::{DataError, SchemaError};
pub use session::AnalysisSession;
