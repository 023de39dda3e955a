//! Transfer strategies used by the [`Fetcher`](crate::Fetcher).
//!
//! A strategy moves the bytes behind a URL into a local file. Strategies are
//! tried in order, so each one only has to report whether *it* succeeded.

use crate::download::error::TransferError;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::debug;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::io::StreamReader;

/// One way of retrieving a remote resource into a local file.
///
/// Implementations overwrite `destination` if it already holds bytes from a
/// previous attempt.
#[async_trait]
pub trait TransferStrategy: Send + Sync {
    /// Short name used in logs and error summaries.
    fn name(&self) -> &'static str;

    async fn transfer(&self, url: &str, destination: &Path) -> Result<(), TransferError>;
}

/// Shells out to the `curl` utility.
pub struct CurlTransfer {
    program: String,
    user_agent: String,
    timeout: Duration,
}

impl CurlTransfer {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        Self {
            program: "curl".to_string(),
            user_agent: user_agent.to_string(),
            timeout,
        }
    }

    /// Uses a different executable, e.g. an absolute path to curl.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl TransferStrategy for CurlTransfer {
    fn name(&self) -> &'static str {
        "curl"
    }

    async fn transfer(&self, url: &str, destination: &Path) -> Result<(), TransferError> {
        debug!("Running {} for {}", self.program, url);
        let output = Command::new(&self.program)
            .arg("--fail")
            .arg("--location")
            .arg("--silent")
            .arg("--show-error")
            .arg("--user-agent")
            .arg(&self.user_agent)
            .arg("--max-time")
            .arg(self.timeout.as_secs().max(1).to_string())
            .arg("--output")
            .arg(destination)
            .arg(url)
            .output()
            .await
            .map_err(|e| TransferError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(TransferError::CommandFailed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Streams the response body with the built-in HTTP client.
pub struct HttpTransfer {
    client: Client,
}

impl HttpTransfer {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransferError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(TransferError::ClientBuild)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TransferStrategy for HttpTransfer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn transfer(&self, url: &str, destination: &Path) -> Result<(), TransferError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransferError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    TransferError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    TransferError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let reader = StreamReader::new(stream);
        tokio::pin!(reader);

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| TransferError::Io(destination.to_path_buf(), e))?;
        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| TransferError::Io(destination.to_path_buf(), e))?;
        file.flush()
            .await
            .map_err(|e| TransferError::Io(destination.to_path_buf(), e))?;

        debug!("Streamed {} bytes from {}", written, url);
        Ok(())
    }
}
