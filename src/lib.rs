pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod generator;
pub mod ipc;
pub mod logging;
pub mod native_host;
pub mod transfer;
pub mod vault;
