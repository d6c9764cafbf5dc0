//! The unlocked-vault state machine.
//!
//! `VaultSession` is the single owner of the in-memory `Vault`, the
//! derived `MasterKey` and the lock flag.  The CLI and every IPC
//! connection handler share one session behind an `Arc`; all access goes
//! through a `parking_lot::RwLock`, so readers never observe a vault
//! that is halfway through a mutation.
//!
//! Mutations work on a copy: the copy is changed, persisted, and only
//! then swapped in.  A failed write leaves memory matching disk.
//!
//! Argon2 runs outside the lock so a slow unlock does not stall
//! concurrent readers; the vault file itself is only read and swapped
//! in while the write lock is held.

use std::io::Read;
use std::path::Path;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::crypto::{
    derive_key_with_params, generate_salt, hash_password, verify_password, KdfParams, MasterKey,
};
use crate::errors::{Result, VaultError};
use crate::transfer::{self, ImportReport};

use super::domain::{categorize_by_url, icon_url, matches_url};
use super::model::{Credential, CredentialInput, CreditCard, CreditCardInput, Vault};
use super::store::{write_atomic, VaultStore};

/// Minimum length of a new master password.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Category used when none is given.
pub const DEFAULT_CATEGORY: &str = "Other";

const EVENT_CAPACITY: usize = 32;

/// Notifications for observers of the session (the presentation layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Unlocked,
    Locked,
    CredentialsChanged,
}

/// Everything that exists only while the vault is open.
struct OpenVault {
    vault: Vault,
    key: MasterKey,
    password_hash: String,
}

enum SessionState {
    Locked,
    Unlocked(Box<OpenVault>),
}

impl SessionState {
    fn open(&self) -> Result<&OpenVault> {
        match self {
            Self::Unlocked(open) => Ok(open),
            Self::Locked => Err(VaultError::Locked),
        }
    }

    fn open_mut(&mut self) -> Result<&mut OpenVault> {
        match self {
            Self::Unlocked(open) => Ok(open),
            Self::Locked => Err(VaultError::Locked),
        }
    }

    /// Replace the state, wiping whatever vault was held before.
    fn replace(&mut self, next: SessionState) -> bool {
        match std::mem::replace(self, next) {
            Self::Unlocked(mut open) => {
                open.vault.wipe();
                true
            }
            Self::Locked => false,
        }
    }
}

/// The one open-or-closed vault of this process.
pub struct VaultSession {
    store: VaultStore,
    kdf: KdfParams,
    state: RwLock<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl VaultSession {
    /// A locked session over `store` with the standard KDF cost.
    pub fn new(store: VaultStore) -> Self {
        Self::with_kdf_params(store, KdfParams::default())
    }

    /// A locked session with explicit KDF cost parameters.
    ///
    /// Vaults created with non-default parameters can only be opened by
    /// a session using the same parameters.
    pub fn with_kdf_params(store: VaultStore, kdf: KdfParams) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            kdf,
            state: RwLock::new(SessionState::Locked),
            events,
        }
    }

    pub fn store(&self) -> &VaultStore {
        &self.store
    }

    /// True if a vault file exists on disk.
    pub fn vault_exists(&self) -> bool {
        self.store.exists()
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(*self.state.read(), SessionState::Unlocked(_))
    }

    /// Receive `SessionEvent`s from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Create and persist an empty vault, leaving the session unlocked.
    pub fn create(&self, password: &str) -> Result<()> {
        if self.store.exists() {
            return Err(VaultError::VaultAlreadyExists(
                self.store.vault_path().to_path_buf(),
            ));
        }

        let salt = generate_salt()?;
        let key = derive_key_with_params(password.as_bytes(), &salt, &self.kdf)?;

        // Existence check and first write happen under one lock so two
        // concurrent creates cannot both write a salt.
        let mut state = self.state.write();
        if self.store.exists() {
            return Err(VaultError::VaultAlreadyExists(
                self.store.vault_path().to_path_buf(),
            ));
        }
        let vault = Vault::empty(salt);
        self.store.save(&vault, &key)?;

        state.replace(SessionState::Unlocked(Box::new(OpenVault {
            vault,
            key,
            password_hash: hash_password(password),
        })));
        drop(state);

        info!(path = %self.store.dir().display(), "vault created");
        self.notify(SessionEvent::Unlocked);
        Ok(())
    }

    /// Open the vault with `password`.
    ///
    /// On failure the session keeps whatever state it had.  The file is
    /// read under the write lock, so a mutation committed while the key
    /// was being derived is part of what gets loaded.
    pub fn unlock(&self, password: &str) -> Result<()> {
        if !self.store.exists() {
            return Err(VaultError::VaultNotFound(
                self.store.vault_path().to_path_buf(),
            ));
        }

        let salt = self.store.load_salt()?;
        let key = derive_key_with_params(password.as_bytes(), &salt, &self.kdf)?;

        let mut state = self.state.write();
        // A password change may have replaced the salt meanwhile.
        let current_salt = self.store.load_salt()?;
        let key = if current_salt == salt {
            key
        } else {
            derive_key_with_params(password.as_bytes(), &current_salt, &self.kdf)?
        };
        let vault = match self.store.load(&key, current_salt) {
            Ok(vault) => vault,
            Err(e) => {
                warn!("unlock failed: {e}");
                return Err(e);
            }
        };

        let credentials = vault.credentials.len();
        state.replace(SessionState::Unlocked(Box::new(OpenVault {
            vault,
            key,
            password_hash: hash_password(password),
        })));
        drop(state);

        info!(credentials, "vault unlocked");
        self.notify(SessionEvent::Unlocked);
        Ok(())
    }

    /// Drop the in-memory vault and key.  Always succeeds.
    pub fn lock(&self) {
        let was_unlocked = self.state.write().replace(SessionState::Locked);
        if was_unlocked {
            info!("vault locked");
            self.notify(SessionEvent::Locked);
        }
    }

    /// Re-key the vault under `new` with a fresh salt.
    pub fn change_password(&self, current: &str, new: &str) -> Result<()> {
        if !verify_password(current, &self.state.read().open()?.password_hash) {
            return Err(VaultError::Authentication);
        }
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(VaultError::Policy(format!(
                "new password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let salt = generate_salt()?;
        let key = derive_key_with_params(new.as_bytes(), &salt, &self.kdf)?;

        let mut state = self.state.write();
        let open = state.open_mut()?;
        // The lock was released while deriving; the session may have
        // been re-opened under another password meanwhile.
        if !verify_password(current, &open.password_hash) {
            return Err(VaultError::Authentication);
        }

        let mut next = open.vault.clone();
        next.salt = salt;
        if let Err(e) = self.store.save(&next, &key) {
            next.wipe();
            return Err(e);
        }

        let mut old = std::mem::replace(&mut open.vault, next);
        old.wipe();
        open.key = key;
        open.password_hash = hash_password(new);
        info!("master password changed");
        Ok(())
    }

    /// Lock, then remove the vault and salt files.
    pub fn delete_vault(&self) -> Result<()> {
        self.lock();
        self.store.delete()?;
        warn!(path = %self.store.dir().display(), "vault deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------

    /// Every credential, in stored order.
    pub fn credentials(&self) -> Result<Vec<Credential>> {
        Ok(self.state.read().open()?.vault.credentials.clone())
    }

    pub fn credential(&self, id: &str) -> Result<Credential> {
        let state = self.state.read();
        let vault = &state.open()?.vault;
        vault
            .credential_index(id)
            .map(|i| vault.credentials[i].clone())
            .ok_or_else(|| VaultError::CredentialNotFound(id.to_string()))
    }

    /// Credentials whose domain or service name matches the site of `url`.
    pub fn search(&self, url: &str) -> Result<Vec<Credential>> {
        let state = self.state.read();
        Ok(state
            .open()?
            .vault
            .credentials
            .iter()
            .filter(|c| matches_url(url, &c.url, &c.service_name))
            .cloned()
            .collect())
    }

    pub fn add_credential(&self, input: CredentialInput) -> Result<Credential> {
        let credential = Credential {
            id: new_id(),
            icon_url: icon_url(&input.url),
            category: category_or_default(input.category),
            service_name: input.service_name,
            url: input.url,
            username: input.username,
            password: input.password,
            is_favorite: false,
            created_at: Utc::now(),
        };

        self.mutate(|vault| {
            vault.credentials.push(credential.clone());
            Ok(())
        })?;
        debug!(id = %credential.id, "credential added");
        Ok(credential)
    }

    /// Replace the user-editable fields of a credential.
    ///
    /// `id`, `createdAt` and `isFavorite` are kept.
    pub fn update_credential(&self, id: &str, input: CredentialInput) -> Result<Credential> {
        self.mutate(|vault| {
            let index = vault
                .credential_index(id)
                .ok_or_else(|| VaultError::CredentialNotFound(id.to_string()))?;
            let cred = &mut vault.credentials[index];
            cred.icon_url = icon_url(&input.url);
            cred.category = category_or_default(input.category);
            cred.service_name = input.service_name;
            cred.url = input.url;
            cred.username = input.username;
            cred.password = input.password;
            Ok(cred.clone())
        })
    }

    pub fn delete_credential(&self, id: &str) -> Result<()> {
        self.mutate(|vault| {
            let index = vault
                .credential_index(id)
                .ok_or_else(|| VaultError::CredentialNotFound(id.to_string()))?;
            vault.credentials.remove(index);
            Ok(())
        })
    }

    /// Flip the favorite flag and return its new value.
    pub fn toggle_favorite(&self, id: &str) -> Result<bool> {
        self.mutate(|vault| {
            let index = vault
                .credential_index(id)
                .ok_or_else(|| VaultError::CredentialNotFound(id.to_string()))?;
            let cred = &mut vault.credentials[index];
            cred.is_favorite = !cred.is_favorite;
            Ok(cred.is_favorite)
        })
    }

    // ------------------------------------------------------------------
    // Credit cards
    // ------------------------------------------------------------------

    pub fn credit_cards(&self) -> Result<Vec<CreditCard>> {
        Ok(self.state.read().open()?.vault.credit_cards.clone())
    }

    pub fn add_credit_card(&self, input: CreditCardInput) -> Result<CreditCard> {
        let card = CreditCard {
            id: new_id(),
            card_name: input.card_name,
            cardholder_name: input.cardholder_name,
            card_number: input.card_number,
            expiry_month: input.expiry_month,
            expiry_year: input.expiry_year,
            cvv: input.cvv,
            card_type: input.card_type,
            billing_zip: input.billing_zip,
            is_favorite: false,
            created_at: Utc::now(),
        };

        self.mutate(|vault| {
            vault.credit_cards.push(card.clone());
            Ok(())
        })?;
        Ok(card)
    }

    pub fn delete_credit_card(&self, id: &str) -> Result<()> {
        self.mutate(|vault| {
            let index = vault
                .credit_cards
                .iter()
                .position(|c| c.id == id)
                .ok_or_else(|| VaultError::CreditCardNotFound(id.to_string()))?;
            vault.credit_cards.remove(index);
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Import / export
    // ------------------------------------------------------------------

    /// Import a browser CSV export, skipping (url, username) duplicates.
    ///
    /// Persists once, and only if something was imported.
    pub fn import_csv<R: Read>(&self, input: R) -> Result<ImportReport> {
        self.state.read().open()?;
        let logins = transfer::parse_csv(input)?;

        let report = self.apply(|vault| {
            let mut report = ImportReport::new(logins.len());
            for login in logins {
                if vault.contains_login(&login.url, &login.username) {
                    report.record_duplicate(&login.service_name, &login.username);
                    continue;
                }
                vault.credentials.push(Credential {
                    id: new_id(),
                    category: categorize_by_url(&login.url).to_string(),
                    icon_url: icon_url(&login.url),
                    service_name: login.service_name,
                    url: login.url,
                    username: login.username,
                    password: login.password,
                    is_favorite: false,
                    created_at: Utc::now(),
                });
                report.imported += 1;
            }
            let changed = report.imported > 0;
            Ok((report, changed))
        })?;

        info!(
            imported = report.imported,
            skipped = report.skipped,
            "CSV import finished"
        );
        Ok(report)
    }

    /// Write every credential to `path` as CSV.  Returns the row count.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        let mut buf = Vec::new();
        let count = {
            let state = self.state.read();
            let credentials = &state.open()?.vault.credentials;
            transfer::write_csv(&mut buf, credentials)?;
            credentials.len()
        };

        let written = write_atomic(path, &buf);
        zeroize::Zeroize::zeroize(&mut buf);
        written?;
        Ok(count)
    }

    /// Seal the credential list to `path` under the current key.
    pub fn export_backup(&self, path: &Path) -> Result<usize> {
        let state = self.state.read();
        let open = state.open()?;
        self.store.export_backup(&open.vault, &open.key, path)?;
        Ok(open.vault.credentials.len())
    }

    /// Restore credentials from a backup sealed under the current key.
    ///
    /// Same duplicate rule as CSV import.  Entries whose id is already
    /// taken get a fresh one.
    pub fn import_backup(&self, path: &Path) -> Result<ImportReport> {
        let restored = {
            let state = self.state.read();
            self.store.import_backup(path, &state.open()?.key)?
        };

        self.apply(|vault| {
            let mut report = ImportReport::new(restored.len());
            for mut cred in restored {
                if vault.contains_login(&cred.url, &cred.username) {
                    report.record_duplicate(&cred.service_name, &cred.username);
                    continue;
                }
                if vault.credential_index(&cred.id).is_some() {
                    cred.id = new_id();
                }
                vault.credentials.push(cred);
                report.imported += 1;
            }
            let changed = report.imported > 0;
            Ok((report, changed))
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Run `f` on a copy of the vault, persist the copy, then commit it.
    fn mutate<T>(&self, f: impl FnOnce(&mut Vault) -> Result<T>) -> Result<T> {
        self.apply(|vault| f(vault).map(|out| (out, true)))
    }

    /// Like `mutate`, but `f` reports whether anything changed; an
    /// unchanged copy is discarded without touching disk.
    fn apply<T>(&self, f: impl FnOnce(&mut Vault) -> Result<(T, bool)>) -> Result<T> {
        let mut state = self.state.write();
        let open = state.open_mut()?;

        let mut next = open.vault.clone();
        let (out, changed) = match f(&mut next) {
            Ok(result) => result,
            Err(e) => {
                next.wipe();
                return Err(e);
            }
        };
        if !changed {
            next.wipe();
            return Ok(out);
        }

        if let Err(e) = self.store.save(&next, &open.key) {
            next.wipe();
            return Err(e);
        }
        let mut old = std::mem::replace(&mut open.vault, next);
        old.wipe();
        drop(state);

        self.notify(SessionEvent::CredentialsChanged);
        Ok(out)
    }

    fn notify(&self, event: SessionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

impl Drop for VaultSession {
    fn drop(&mut self) {
        self.state.get_mut().replace(SessionState::Locked);
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn category_or_default(category: String) -> String {
    if category.trim().is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        category
    }
}
