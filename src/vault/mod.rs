//! Vault module: the credential data model and its encrypted storage.
//!
//! This module provides:
//! - `Credential`, `CreditCard` and the `Vault` aggregate (`model`)
//! - URL helpers used for matching and enrichment (`domain`)
//! - `VaultStore`, the on-disk salt and sealed blob (`store`)
//! - `VaultSession`, the lock/unlock state machine and mutation API (`session`)

pub mod domain;
pub mod model;
pub mod session;
pub mod store;

pub use model::{Credential, CredentialInput, CreditCard, CreditCardInput, Vault};
pub use session::{SessionEvent, VaultSession, DEFAULT_CATEGORY, MIN_PASSWORD_LEN};
pub use store::VaultStore;
