use polars::error::PolarsError;
use polars::prelude::DataType;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Category '{0}' has no entry in the colour scale")]
    UnmappedCategory(String),

    #[error("Column '{column}' for the {channel} channel not found")]
    MissingChannel {
        channel: &'static str,
        column: String,
    },

    #[error("Column '{column}' for the {channel} channel has type {found}, expected {expected}")]
    ChannelType {
        channel: &'static str,
        column: String,
        expected: &'static str,
        found: DataType,
    },

    #[error("Invalid colour '{0}', expected #RRGGBB")]
    InvalidColor(String),

    #[error("Unsupported chart output '{0}', expected a .svg or .png path")]
    UnsupportedOutput(PathBuf),

    #[error("Failed to draw chart to '{path}': {message}")]
    Draw { path: PathBuf, message: String },

    #[error("Failed reading chart data: {0}")]
    Polars(#[from] PolarsError),
}
