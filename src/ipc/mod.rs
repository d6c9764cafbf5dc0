//! Local IPC between the vault process and the native messaging host.
//!
//! This module provides:
//! - The request/response wire types and validation (`protocol`)
//! - Unix socket / named pipe plumbing (`transport`)
//! - The vault-side server (`server`)
//! - The retrying one-shot client (`client`)

pub mod client;
pub mod protocol;
pub mod server;
pub mod transport;

pub use client::VaultClient;
pub use protocol::{RawRequest, VaultRequest, VaultResponse};
pub use server::{handle_request, IpcServer, ServerConfig, ServerHandle};
