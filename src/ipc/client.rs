//! The dialing side of the local channel, used by the native host.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::vault::{Credential, CredentialInput, CreditCard};

use super::protocol::{encode_line, RawRequest, VaultRequest, VaultResponse};
use super::transport::{self, ClientStream};

/// One-shot request client with a dial-retry loop.
#[derive(Debug, Clone)]
pub struct VaultClient {
    channel_path: PathBuf,
    connect_timeout: Duration,
    retry_interval: Duration,
    response_timeout: Duration,
    max_response_bytes: usize,
}

impl VaultClient {
    pub fn new(channel_path: impl Into<PathBuf>) -> Self {
        let defaults = Settings::default();
        Self {
            channel_path: channel_path.into(),
            connect_timeout: defaults.connect_timeout(),
            retry_interval: defaults.retry_interval(),
            response_timeout: defaults.response_timeout(),
            max_response_bytes: defaults.max_response_bytes,
        }
    }

    pub fn from_settings(settings: &Settings, data_dir: &Path) -> Self {
        Self {
            channel_path: settings.channel_path(data_dir),
            connect_timeout: settings.connect_timeout(),
            retry_interval: settings.retry_interval(),
            response_timeout: settings.response_timeout(),
            max_response_bytes: settings.max_response_bytes,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn channel_path(&self) -> &Path {
        &self.channel_path
    }

    /// Dial until connected or until the connect timeout has elapsed.
    pub async fn connect(&self) -> Result<ClientStream> {
        let deadline = Instant::now() + self.connect_timeout;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match tokio::time::timeout_at(deadline, transport::connect(&self.channel_path)).await {
                Ok(Ok(stream)) => {
                    debug!(attempts, "connected to vault");
                    return Ok(stream);
                }
                Ok(Err(e)) if transport::is_retryable(&e) => {
                    trace!(attempts, "vault not reachable yet: {e}");
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => break,
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(self.retry_interval.min(deadline - now)).await;
        }

        debug!(attempts, "gave up dialing the vault");
        Err(VaultError::ConnectionTimeout(self.connect_timeout))
    }

    /// Send one request and read its one response.
    ///
    /// A vault that accepts but never answers is reported as
    /// `ConnectionTimeout` once the response timeout elapses.
    pub async fn send(&self, request: &VaultRequest) -> Result<VaultResponse> {
        let stream = self.connect().await?;
        let (read_half, mut writer) = tokio::io::split(stream);

        writer
            .write_all(&encode_line(&RawRequest::from(request))?)
            .await?;
        writer.flush().await?;

        let limit = self.max_response_bytes as u64 + 1;
        let mut reader = BufReader::new(read_half.take(limit));
        let mut line = Vec::new();
        tokio::time::timeout(self.response_timeout, reader.read_until(b'\n', &mut line))
            .await
            .map_err(|_| VaultError::ConnectionTimeout(self.response_timeout))??;

        if line.len() > self.max_response_bytes {
            return Err(VaultError::Protocol(format!(
                "response exceeds {} bytes",
                self.max_response_bytes
            )));
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            return Err(VaultError::Protocol(
                "vault closed the connection without responding".into(),
            ));
        }

        serde_json::from_slice(&line)
            .map_err(|e| VaultError::Protocol(format!("malformed response from vault: {e}")))
    }

    pub async fn search(&self, url: &str) -> Result<Vec<Credential>> {
        let response = self
            .send(&VaultRequest::Search { url: url.to_string() })
            .await?;
        into_result(response).map(|r| r.credentials.unwrap_or_default())
    }

    pub async fn save(&self, input: CredentialInput) -> Result<()> {
        into_result(self.send(&VaultRequest::Save(input)).await?).map(|_| ())
    }

    pub async fn credit_cards(&self) -> Result<Vec<CreditCard>> {
        let response = self.send(&VaultRequest::GetCreditCards).await?;
        into_result(response).map(|r| r.credit_cards.unwrap_or_default())
    }
}

/// Turn a failure response into `CommandFailed` with the vault's message.
fn into_result(response: VaultResponse) -> Result<VaultResponse> {
    if response.success {
        Ok(response)
    } else {
        Err(VaultError::CommandFailed(
            response.error.unwrap_or_else(|| "unknown error".into()),
        ))
    }
}
