use thiserror::Error;

/// Raw input rejected before a dataset is produced. A single bad row fails
/// the whole file; no partial dataset is kept.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: cannot parse period '{value}' (expected YYYY-MM)")]
    InvalidPeriod { row: usize, value: String },

    #[error("row {row}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// An engine operation was invoked without usable data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("no dataset loaded")]
    NoDataset,

    #[error("dataset contains no records")]
    EmptyDataset,
}
