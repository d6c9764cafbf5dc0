//! AES-256-GCM authenticated encryption to base64 text.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce,
//! seals the plaintext with no associated data, prepends the nonce and
//! base64-encodes the whole buffer so it can be stored as text.
//!
//! Layout before base64:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::keys::MasterKey;
use crate::errors::{VaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Encrypt `plaintext` under `key`, returning base64(nonce || ciphertext).
pub fn encrypt(key: &MasterKey, plaintext: &[u8]) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(sealed))
}

/// Decrypt text produced by `encrypt`.
///
/// Bad base64, input shorter than a nonce, and a failed tag check all
/// return the same `Authentication` error.
pub fn decrypt(key: &MasterKey, encoded: &str) -> Result<Vec<u8>> {
    let data = BASE64
        .decode(encoded.trim())
        .map_err(|_| VaultError::Authentication)?;

    if data.len() < NONCE_LEN {
        return Err(VaultError::Authentication);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| VaultError::Authentication)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::Authentication)
}
