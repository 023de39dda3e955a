use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to create temporary download file")]
    TempFile(#[source] std::io::Error),

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Failed to launch '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error writing download to '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Transfer produced no bytes at '{0}'")]
    EmptyPayload(PathBuf),

    #[error("All {} transfer strategies failed for {url}: {}", .attempts.len(), .attempts.join("; "))]
    AllStrategiesFailed { url: String, attempts: Vec<String> },
}
