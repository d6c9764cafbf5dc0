use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// All errors that can occur in VaultZero.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Session state ---
    #[error("Vault is locked")]
    Locked,

    // --- Not found ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Salt file not found at {0}; the vault is incomplete")]
    SaltNotFound(PathBuf),

    #[error("Credential '{0}' not found")]
    CredentialNotFound(String),

    #[error("Credit card '{0}' not found")]
    CreditCardNotFound(String),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    // --- Crypto errors ---
    /// Wrong password, tampered data, truncated ciphertext and bad base64
    /// all land here on purpose: callers must not learn which one it was.
    #[error("invalid master password or corrupted vault")]
    Authentication,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    // --- Policy / parsing ---
    #[error("{0}")]
    Policy(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // --- IPC errors ---
    #[error("VaultZero is not running (no connection within {} ms); is it started and unlocked?", .0.as_millis())]
    ConnectionTimeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl VaultError {
    /// True for every "something is absent" variant.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::VaultNotFound(_)
                | Self::SaltNotFound(_)
                | Self::CredentialNotFound(_)
                | Self::CreditCardNotFound(_)
        )
    }
}

/// Convenience type alias for VaultZero results.
pub type Result<T> = std::result::Result<T, VaultError>;
