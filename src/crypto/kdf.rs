//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that makes brute-forcing a stolen
//! `vault.dat` expensive.  The cost parameters are fixed constants:
//! nothing on disk records them, so changing them would lock users out.
//! `KdfParams` exists so tests (and only deliberate callers) can run
//! cheaper derivations.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::TryRngCore;

use super::keys::MasterKey;
use crate::errors::{VaultError, Result};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 1).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 1,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Build custom parameters, rejecting dangerously weak settings.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        if memory_kib < MIN_MEMORY_KIB {
            return Err(VaultError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {memory_kib})"
            )));
        }
        if iterations < 1 {
            return Err(VaultError::KeyDerivationFailed(
                "Argon2 iterations must be at least 1".into(),
            ));
        }
        if parallelism < 1 {
            return Err(VaultError::KeyDerivationFailed(
                "Argon2 parallelism must be at least 1".into(),
            ));
        }
        Ok(Self {
            memory_kib,
            iterations,
            parallelism,
        })
    }
}

/// Derive the 32-byte master key from a password and salt with the
/// default parameters.
///
/// Deterministic: the same password and salt always give the same key.
/// Any password is accepted, including the empty one; length policy
/// belongs to the callers.
pub fn derive_key(password: &[u8], salt: &[u8; SALT_LEN]) -> Result<MasterKey> {
    derive_key_with_params(password, salt, &KdfParams::default())
}

/// Derive the master key with explicit Argon2id parameters.
pub fn derive_key_with_params(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    kdf: &KdfParams,
) -> Result<MasterKey> {
    let params = Params::new(kdf.memory_kib, kdf.iterations, kdf.parallelism, Some(KEY_LEN))
        .map_err(|e| VaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| VaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    // MasterKey::new copies and zeroizes the stack buffer.
    Ok(MasterKey::new(&mut key))
}

/// Generate a cryptographically random 32-byte salt from the OS.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| VaultError::EntropyUnavailable(e.to_string()))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_params_are_rejected() {
        assert!(KdfParams::new(1024, 1, 1).is_err());
        assert!(KdfParams::new(MIN_MEMORY_KIB, 0, 1).is_err());
        assert!(KdfParams::new(MIN_MEMORY_KIB, 1, 0).is_err());
        assert!(KdfParams::new(MIN_MEMORY_KIB, 1, 1).is_ok());
    }

    #[test]
    fn default_params_match_the_on_disk_contract() {
        let p = KdfParams::default();
        assert_eq!(p.memory_kib, 65_536);
        assert_eq!(p.iterations, 1);
        assert_eq!(p.parallelism, 4);
    }

    #[test]
    fn generated_salts_differ() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_ne!(a, b);
    }
}
