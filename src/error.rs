/// Error type shared by the table model, the loaders and the dashboard sections.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Column '{0}' not found")]
    MissingColumn(String),

    #[error("Row {row}, column '{column}': cannot parse '{value}' as {expected}")]
    Parse {
        row: usize,
        column: String,
        value: String,
        expected: String,
    },

    #[error("Type mismatch in column '{column}': expected {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Row {row} out of range [0, {len})")]
    RowOutOfRange { row: usize, len: usize },

    #[error("Column '{column}' has {found} values, table has {expected} rows")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
