use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to parse CSV data in '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("CSV column count ({found}) does not match schema length ({expected}) in '{path}'")]
    SchemaMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Line {line} of '{path}' has {found} fields, expected {expected}")]
    RaggedRow {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Failed to scan CSV records in '{path}'")]
    Scan {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to assign column names for '{path}': {source}")]
    ColumnRename { path: PathBuf, source: PolarsError },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Required column '{column}' not found after renaming")]
    SchemaMismatch { column: String },

    #[error("Value '{value}' in column '{column}' (row {row}) could not be converted to a date")]
    ValueError {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Unexpected data state: {0}")]
    UnexpectedData(String),

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),
}
