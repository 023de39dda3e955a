use crate::download::error::TransferError;
use crate::download::strategy::{CurlTransfer, HttpTransfer, TransferStrategy};
use log::{info, warn};
use std::path::Path;
use std::time::Duration;
use tempfile::{Builder, TempPath};

/// A downloaded payload living in a temporary file.
///
/// The file is removed when this value is dropped, whichever way the caller
/// finishes with it.
#[derive(Debug)]
pub struct FetchedFile {
    path: TempPath,
    bytes: u64,
    strategy: &'static str,
}

impl FetchedFile {
    pub(crate) fn new(path: TempPath, bytes: u64, strategy: &'static str) -> Self {
        Self {
            path,
            bytes,
            strategy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Name of the strategy that produced the file.
    pub fn strategy(&self) -> &'static str {
        self.strategy
    }
}

/// Retrieves a remote resource by trying an ordered list of
/// [`TransferStrategy`]s until one leaves a non-empty file behind.
pub struct Fetcher {
    strategies: Vec<Box<dyn TransferStrategy>>,
}

impl Fetcher {
    /// curl first, then the built-in HTTP client.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransferError> {
        Ok(Self::with_strategies(vec![
            Box::new(CurlTransfer::new(user_agent, timeout)),
            Box::new(HttpTransfer::new(user_agent, timeout)?),
        ]))
    }

    pub fn with_strategies(strategies: Vec<Box<dyn TransferStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn fetch(&self, url: &str) -> Result<FetchedFile, TransferError> {
        let path = Builder::new()
            .prefix("urchin-biomass-")
            .suffix(".csv")
            .tempfile()
            .map_err(TransferError::TempFile)?
            .into_temp_path();

        let mut attempts = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            info!("Downloading {} via {}", url, strategy.name());
            let failure = match strategy.transfer(url, &path).await {
                Ok(()) => match payload_size(&path).await {
                    Some(bytes) if bytes > 0 => {
                        info!(
                            "Downloaded {} bytes from {} via {}",
                            bytes,
                            url,
                            strategy.name()
                        );
                        return Ok(FetchedFile::new(path, bytes, strategy.name()));
                    }
                    _ => TransferError::EmptyPayload(path.to_path_buf()),
                },
                Err(e) => e,
            };
            warn!("Transfer via {} failed: {}", strategy.name(), failure);
            attempts.push(format!("{}: {}", strategy.name(), failure));
        }

        Err(TransferError::AllStrategiesFailed {
            url: url.to_string(),
            attempts,
        })
    }
}

/// `None` when the size cannot be determined.
async fn payload_size(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path).await.ok().map(|m| m.len())
}
