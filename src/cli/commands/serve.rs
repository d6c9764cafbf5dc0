//! `vaultzero serve`: unlock the vault and answer the native host.
//!
//! Runs until Ctrl-C, then stops the IPC server and locks the vault.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::info;

use crate::cli::output;
use crate::cli::{data_dir, open_session, settings, Cli};
use crate::errors::{Result, VaultError};
use crate::ipc::{IpcServer, ServerConfig};
use crate::vault::{SessionEvent, VaultSession};

/// Execute the `serve` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let data_dir = data_dir(cli)?;
    let settings = settings(cli)?;
    let session = Arc::new(open_session(cli)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| VaultError::CommandFailed(format!("tokio runtime: {e}")))?;

    runtime.block_on(async {
        let config = ServerConfig::from_settings(&settings, &data_dir);
        let handle = IpcServer::new(Arc::clone(&session), config).start().await?;
        tokio::spawn(log_events(Arc::clone(&session)));

        output::success(&format!(
            "Vault unlocked, serving on {}",
            handle.channel_path().display()
        ));
        output::tip("Press Ctrl-C to lock the vault and stop.");

        tokio::signal::ctrl_c().await?;
        info!("shutdown requested");
        handle.stop().await
    })?;

    session.lock();
    output::success("Vault locked.");
    Ok(())
}

async fn log_events(session: Arc<VaultSession>) {
    let mut events = session.subscribe();
    loop {
        match events.recv().await {
            Ok(SessionEvent::CredentialsChanged) => info!("credentials changed"),
            Ok(event) => info!(?event, "session event"),
            Err(RecvError::Lagged(missed)) => info!(missed, "session events dropped"),
            Err(RecvError::Closed) => break,
        }
    }
}
