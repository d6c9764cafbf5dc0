//! The vault-side IPC server.
//!
//! Every accepted connection gets exactly one read, dispatch, write,
//! close cycle in its own task.  A semaphore caps how many connections
//! are in flight; once the cap is reached the accept loop waits for a
//! slot instead of spawning more work.  Connection tasks live in a
//! `JoinSet` so shutdown can wait for them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::vault::store::create_private_dir;
use crate::vault::VaultSession;

use super::protocol::{encode_line, parse_request, VaultRequest, VaultResponse};
use super::transport::Listener;

/// Longest request line the server will read.
pub const MAX_REQUEST_BYTES: u64 = 64 * 1024;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Server tuning, usually taken from `Settings`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub channel_path: PathBuf,
    pub max_connections: usize,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn from_settings(settings: &Settings, data_dir: &Path) -> Self {
        Self {
            channel_path: settings.channel_path(data_dir),
            max_connections: settings.max_connections.max(1),
            request_timeout: settings.request_timeout(),
        }
    }
}

pub struct IpcServer {
    session: Arc<VaultSession>,
    config: ServerConfig,
}

/// A running server.  Dropping the handle also stops the accept loop,
/// but only `stop` waits for in-flight connections.
pub struct ServerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    channel_path: PathBuf,
}

impl ServerHandle {
    pub fn channel_path(&self) -> &Path {
        &self.channel_path
    }

    /// Stop accepting, wait for in-flight connections, release the channel.
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| VaultError::CommandFailed(format!("IPC server task failed: {e}")))
    }
}

impl IpcServer {
    pub fn new(session: Arc<VaultSession>, config: ServerConfig) -> Self {
        Self { session, config }
    }

    /// Bind the channel and start the accept loop in the background.
    pub async fn start(self) -> Result<ServerHandle> {
        if let Some(parent) = self.config.channel_path.parent() {
            if cfg!(unix) {
                create_private_dir(parent)?;
            }
        }
        let listener = Listener::bind(&self.config.channel_path).await?;
        info!(
            channel = %self.config.channel_path.display(),
            max_connections = self.config.max_connections,
            "IPC server listening"
        );

        let (shutdown, shutdown_rx) = watch::channel(false);
        let channel_path = self.config.channel_path.clone();
        let task = tokio::spawn(self.accept_loop(listener, shutdown_rx));

        Ok(ServerHandle {
            shutdown,
            task,
            channel_path,
        })
    }

    async fn accept_loop(self, mut listener: Listener, mut shutdown: watch::Receiver<bool>) {
        let limit = Arc::new(Semaphore::new(self.config.max_connections));
        let mut tasks = JoinSet::new();

        loop {
            // Reap finished connections so the set does not grow.
            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    error!("connection task panicked: {e}");
                }
            }

            let permit = tokio::select! {
                _ = shutdown.changed() => break,
                permit = limit.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let stream = tokio::select! {
                _ = shutdown.changed() => break,
                accepted = listener.accept() => match accepted {
                    Ok(stream) => stream,
                    Err(e) => {
                        warn!("accept failed: {e}");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
            };

            let session = Arc::clone(&self.session);
            let request_timeout = self.config.request_timeout;
            tasks.spawn(async move {
                let _permit = permit;
                if let Err(e) = handle_connection(stream, session, request_timeout).await {
                    debug!("connection ended with error: {e}");
                }
            });
        }

        drop(listener);
        info!(in_flight = tasks.len(), "IPC server stopping");
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("connection task panicked: {e}");
            }
        }
    }
}

/// Serve one connection: read one request line, answer it, close.
pub async fn handle_connection<S>(
    stream: S,
    session: Arc<VaultSession>,
    request_timeout: Duration,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half.take(MAX_REQUEST_BYTES));

    let mut line = String::new();
    let response = match tokio::time::timeout(request_timeout, reader.read_line(&mut line)).await {
        Err(_) => {
            debug!("client sent no request in time");
            VaultResponse::failure("Request timed out")
        }
        Ok(Ok(0)) => return Ok(()),
        Ok(Err(e)) => {
            debug!("unreadable request: {e}");
            VaultResponse::failure(super::protocol::INVALID_REQUEST)
        }
        Ok(Ok(_)) => match parse_request(&line) {
            Ok(request) => dispatch(session, request).await,
            Err(e) => {
                debug!("rejected request: {e}");
                VaultResponse::from(&e)
            }
        },
    };

    writer.write_all(&encode_line(&response)?).await?;
    writer.flush().await?;
    writer.shutdown().await?;
    Ok(())
}

/// Run a request on the blocking pool; saving re-encrypts and writes
/// the vault file.
async fn dispatch(session: Arc<VaultSession>, request: VaultRequest) -> VaultResponse {
    let action = request.action();
    match tokio::task::spawn_blocking(move || handle_request(&session, request)).await {
        Ok(response) => {
            debug!(action, success = response.success, "request handled");
            response
        }
        Err(e) => {
            error!(action, "request handler failed: {e}");
            VaultResponse::failure("Internal error")
        }
    }
}

/// Answer a validated request from the session.
///
/// Every session error, `Locked` included, becomes a failure response.
pub fn handle_request(session: &VaultSession, request: VaultRequest) -> VaultResponse {
    let result = match request {
        VaultRequest::Search { url } => session.search(&url).map(VaultResponse::with_credentials),
        VaultRequest::Save(input) => session.add_credential(input).map(|_| VaultResponse::ok()),
        VaultRequest::GetCreditCards => session
            .credit_cards()
            .map(VaultResponse::with_credit_cards),
    };
    result.unwrap_or_else(|e| VaultResponse::from(&e))
}
