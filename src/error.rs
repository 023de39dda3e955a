use crate::chart::error::RenderError;
use crate::config::ConfigError;
use crate::download::error::TransferError;
use crate::table::error::{LoadError, NormalizeError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UrchinError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create output directory for '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),
}
