//! On-disk persistence for the vault.
//!
//! Two files live in the data directory:
//!
//! ```text
//! vault.salt   base64(32 raw salt bytes)                      plaintext, not secret
//! vault.dat    base64(nonce | AES-GCM(JSON payload) | tag)   sealed
//! ```
//!
//! The payload is `{"credentials": [...], "creditCards": [...]}`.
//! Each file is replaced atomically (temp file + rename), but the two
//! writes are independent: a crash in between leaves a fresh salt next
//! to the previous blob.  `vault.dat` missing means "no vault".

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;
use uuid::Uuid;

use crate::crypto::{decrypt, encrypt, MasterKey, SALT_LEN};
use crate::errors::{VaultError, Result};

use super::model::{Credential, StoredPayload, Vault, VaultPayload};

const VAULT_FILE_NAME: &str = "vault.dat";
const SALT_FILE_NAME: &str = "vault.salt";

/// File-level access to `vault.dat` and `vault.salt` in one directory.
#[derive(Debug, Clone)]
pub struct VaultStore {
    dir: PathBuf,
    vault_path: PathBuf,
    salt_path: PathBuf,
}

impl VaultStore {
    /// A store rooted at `dir`.  Nothing is touched on disk until the
    /// first write, which creates the directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            vault_path: dir.join(VAULT_FILE_NAME),
            salt_path: dir.join(SALT_FILE_NAME),
            dir,
        }
    }

    /// True if the sealed vault file exists.
    pub fn exists(&self) -> bool {
        self.vault_path.exists()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }

    pub fn salt_path(&self) -> &Path {
        &self.salt_path
    }

    // ------------------------------------------------------------------
    // Salt
    // ------------------------------------------------------------------

    /// Write the salt file (base64 text).
    pub fn save_salt(&self, salt: &[u8; SALT_LEN]) -> Result<()> {
        self.ensure_dir()?;
        write_atomic(&self.salt_path, BASE64.encode(salt).as_bytes())
    }

    /// Read the salt file.
    pub fn load_salt(&self) -> Result<[u8; SALT_LEN]> {
        if !self.salt_path.exists() {
            return Err(VaultError::SaltNotFound(self.salt_path.clone()));
        }

        let encoded = fs::read_to_string(&self.salt_path)?;
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| VaultError::Parse(format!("salt file is not base64: {e}")))?;

        <[u8; SALT_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
            VaultError::Parse(format!(
                "salt file holds {} bytes, expected {SALT_LEN}",
                bytes.len()
            ))
        })
    }

    // ------------------------------------------------------------------
    // Vault blob
    // ------------------------------------------------------------------

    /// Persist the vault: salt file first, then the sealed payload.
    pub fn save(&self, vault: &Vault, key: &MasterKey) -> Result<()> {
        self.save_salt(&vault.salt)?;

        let payload = VaultPayload {
            credentials: vault.credentials.clone(),
            credit_cards: vault.credit_cards.clone(),
        };
        let sealed = seal_json(&payload, key)?;
        write_atomic(&self.vault_path, sealed.as_bytes())?;

        debug!(
            credentials = vault.credentials.len(),
            credit_cards = vault.credit_cards.len(),
            "vault persisted"
        );
        Ok(())
    }

    /// Read and open the vault with a key derived from `salt`.
    ///
    /// A wrong password and a corrupted file both surface as
    /// `Authentication`; a payload that decrypts but does not parse is
    /// a `Parse` error.
    pub fn load(&self, key: &MasterKey, salt: [u8; SALT_LEN]) -> Result<Vault> {
        if !self.exists() {
            return Err(VaultError::VaultNotFound(self.vault_path.clone()));
        }

        let sealed = fs::read_to_string(&self.vault_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => VaultError::Authentication,
            _ => VaultError::Io(e),
        })?;
        let plaintext = decrypt(key, &sealed)?;

        let stored: StoredPayload = serde_json::from_slice(&plaintext)
            .map_err(|e| VaultError::Parse(format!("vault payload: {e}")))?;
        let payload = VaultPayload::from(stored);

        Ok(Vault {
            credentials: payload.credentials,
            credit_cards: payload.credit_cards,
            salt,
        })
    }

    /// Remove both files.  Missing files are not an error.
    pub fn delete(&self) -> Result<()> {
        remove_if_exists(&self.vault_path)?;
        remove_if_exists(&self.salt_path)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Backups
    // ------------------------------------------------------------------

    /// Seal the credential list (no cards, no salt) to `path`.
    ///
    /// Refuses to overwrite the live vault or salt file.
    pub fn export_backup(&self, vault: &Vault, key: &MasterKey, path: &Path) -> Result<()> {
        if self.is_live_file(path) {
            return Err(VaultError::CommandFailed(
                "refusing to write a backup over the live vault files".into(),
            ));
        }

        let sealed = seal_json(&vault.credentials, key)?;
        write_atomic(path, sealed.as_bytes())
    }

    /// Open a backup file with the current session key.
    pub fn import_backup(&self, path: &Path, key: &MasterKey) -> Result<Vec<Credential>> {
        if !path.exists() {
            return Err(VaultError::CommandFailed(format!(
                "backup file not found: {}",
                path.display()
            )));
        }

        let sealed = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => VaultError::Authentication,
            _ => VaultError::Io(e),
        })?;
        let plaintext = decrypt(key, &sealed)?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| VaultError::Parse(format!("backup payload: {e}")))
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn ensure_dir(&self) -> Result<()> {
        create_private_dir(&self.dir)
    }

    fn is_live_file(&self, path: &Path) -> bool {
        let canonical = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
        let target = canonical(path);
        target == canonical(&self.vault_path) || target == canonical(&self.salt_path)
    }
}

/// Serialize `value` to JSON and seal it.
fn seal_json<T: serde::Serialize + ?Sized>(value: &T, key: &MasterKey) -> Result<String> {
    let mut json = serde_json::to_vec(value)
        .map_err(|e| VaultError::Serialization(format!("vault payload: {e}")))?;
    let sealed = encrypt(key, &json);
    zeroize::Zeroize::zeroize(&mut json);
    sealed
}

/// Create `dir` (and parents) with owner-only permissions.
pub(crate) fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }

    Ok(())
}

/// Write `data` to `path` atomically with owner-only permissions.
///
/// The temp file sits in the same directory so the rename stays on one
/// filesystem.  It is created 0600 before any byte is written, gets a
/// unique name per write, and is removed if the write or rename fails.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp_path = parent.join(format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        Uuid::new_v4().simple()
    ));

    let written = write_new_private(&tmp_path, data).and_then(|()| fs::rename(&tmp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

fn write_new_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
