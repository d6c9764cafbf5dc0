use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "VAULTZERO_HOME";

/// Directory under `$HOME` used when nothing else is configured.
const DEFAULT_DIR_NAME: &str = ".vaultzero";

/// Resolve the data directory: explicit flag, then `VAULTZERO_HOME`,
/// then `~/.vaultzero`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(DEFAULT_DIR_NAME))
        .ok_or_else(|| VaultError::Config("cannot determine the home directory".into()))
}

/// Settings loaded from `<data_dir>/config.toml`.
///
/// Every field has a default so VaultZero works without any config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Well-known local channel name shared by the vault and the native host.
    pub channel_name: String,

    /// How long the native host keeps retrying to connect.
    pub connect_timeout_ms: u64,

    /// Pause between connection attempts.
    pub retry_interval_ms: u64,

    /// How long a client waits for the vault's response.
    pub response_timeout_ms: u64,

    /// How long the server waits for a client's request line.
    pub request_timeout_ms: u64,

    /// Maximum number of IPC connections handled at once.
    pub max_connections: usize,

    /// Largest response a client will read.
    pub max_response_bytes: usize,

    /// Whether the native host writes its diagnostic log.
    pub native_log: bool,

    /// Log file for the native host (default: `<data_dir>/native-host.log`).
    pub native_log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            channel_name: "vaultzero".to_string(),
            connect_timeout_ms: 2_000,
            retry_interval_ms: 100,
            response_timeout_ms: 5_000,
            request_timeout_ms: 5_000,
            max_connections: 16,
            max_response_bytes: 1024 * 1024,
            native_log: true,
            native_log_file: None,
        }
    }
}

impl Settings {
    /// Name of the config file inside the data directory.
    pub const FILE_NAME: &'static str = "config.toml";

    /// Load settings from `<data_dir>/config.toml`.
    ///
    /// A missing file yields defaults; an unparsable one is an error.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;
        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.channel_name.trim().is_empty() {
            return Err(VaultError::Config("channel_name must not be empty".into()));
        }
        if self.max_connections == 0 {
            return Err(VaultError::Config("max_connections must be at least 1".into()));
        }
        Ok(())
    }

    /// Where the local channel lives.
    ///
    /// Unix: a socket file in the data directory.  Windows: a named pipe.
    pub fn channel_path(&self, data_dir: &Path) -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(format!(r"\\.\pipe\{}", self.channel_name))
        } else {
            data_dir.join(format!("{}.sock", self.channel_name))
        }
    }

    /// Native host log file, if logging is enabled.
    pub fn native_log_path(&self, data_dir: &Path) -> Option<PathBuf> {
        if !self.native_log {
            return None;
        }
        Some(
            self.native_log_file
                .clone()
                .unwrap_or_else(|| data_dir.join("native-host.log")),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
