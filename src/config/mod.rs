//! Runtime configuration: where the vault lives and how the IPC channel
//! behaves.

pub mod settings;

pub use settings::{resolve_data_dir, Settings, DATA_DIR_ENV};
