//! Cryptographic primitives for VaultZero.
//!
//! This module provides:
//! - Argon2id password-based key derivation (`kdf`)
//! - AES-256-GCM encryption and decryption to base64 text (`encryption`)
//! - The zeroizing `MasterKey` wrapper (`keys`)
//! - The fast in-memory password check (`password`)

pub mod encryption;
pub mod kdf;
pub mod keys;
pub mod password;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt};
pub use kdf::{derive_key, derive_key_with_params, generate_salt, KdfParams, KEY_LEN, SALT_LEN};
pub use keys::MasterKey;
pub use password::{hash_password, verify_password};
