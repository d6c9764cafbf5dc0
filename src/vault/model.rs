//! Credential, CreditCard and the Vault aggregate.
//!
//! Field names serialize in camelCase because the same JSON shape is
//! written to disk and sent over the IPC channel to the browser.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::SALT_LEN;

/// One stored login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Opaque unique identifier, set at creation and never changed.
    pub id: String,
    pub service_name: String,
    pub url: String,
    pub username: String,
    /// Plaintext while unlocked; only ever written inside the AEAD envelope.
    pub password: String,
    pub category: String,
    /// Derived from `url`, not user-authoritative.
    #[serde(rename = "iconURL", default)]
    pub icon_url: String,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

/// User-supplied fields for adding or replacing a credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInput {
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub category: String,
}

/// Payment card data, sealed in the same envelope as credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    pub id: String,
    /// Nickname, e.g. "Personal Visa".
    pub card_name: String,
    pub cardholder_name: String,
    pub card_number: String,
    /// MM
    pub expiry_month: String,
    /// YYYY
    pub expiry_year: String,
    pub cvv: String,
    /// visa, mastercard, amex, ...
    pub card_type: String,
    #[serde(default)]
    pub billing_zip: String,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

/// User-supplied fields for a new credit card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardInput {
    pub card_name: String,
    pub cardholder_name: String,
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub card_type: String,
    #[serde(default)]
    pub billing_zip: String,
}

/// The aggregate root: everything one master password protects.
///
/// `salt` must be the salt the session key was derived from; saving
/// writes it next to the blob so the next unlock derives the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    pub credentials: Vec<Credential>,
    pub credit_cards: Vec<CreditCard>,
    pub salt: [u8; SALT_LEN],
}

impl Vault {
    /// An empty vault bound to `salt`.
    pub fn empty(salt: [u8; SALT_LEN]) -> Self {
        Self {
            credentials: Vec::new(),
            credit_cards: Vec::new(),
            salt,
        }
    }

    /// Overwrite every secret field in place before the vault is dropped.
    pub fn wipe(&mut self) {
        for cred in &mut self.credentials {
            cred.password.zeroize();
        }
        for card in &mut self.credit_cards {
            card.card_number.zeroize();
            card.cvv.zeroize();
        }
        self.credentials.clear();
        self.credit_cards.clear();
    }

    /// Position of a credential by id (linear scan, order preserved).
    pub fn credential_index(&self, id: &str) -> Option<usize> {
        self.credentials.iter().position(|c| c.id == id)
    }

    /// True if a credential with exactly this (url, username) pair exists.
    ///
    /// This is the duplicate key used by CSV import and backup restore.
    pub fn contains_login(&self, url: &str, username: &str) -> bool {
        self.credentials
            .iter()
            .any(|c| c.url == url && c.username == username)
    }
}

/// The plaintext that goes inside `vault.dat`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VaultPayload {
    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub credit_cards: Vec<CreditCard>,
}

/// Older vault files held only the credential array.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredPayload {
    Current(VaultPayload),
    Legacy(Vec<Credential>),
}

impl From<StoredPayload> for VaultPayload {
    fn from(stored: StoredPayload) -> Self {
        match stored {
            StoredPayload::Current(payload) => payload,
            StoredPayload::Legacy(credentials) => Self {
                credentials,
                credit_cards: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(id: &str, url: &str, user: &str) -> Credential {
        Credential {
            id: id.into(),
            service_name: "Svc".into(),
            url: url.into(),
            username: user.into(),
            password: "pw".into(),
            category: "Other".into(),
            icon_url: String::new(),
            is_favorite: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn credential_serializes_with_wire_field_names() {
        let json = serde_json::to_value(cred("1", "https://a.com", "al")).unwrap();
        assert!(json.get("serviceName").is_some());
        assert!(json.get("iconURL").is_some());
        assert!(json.get("isFavorite").is_some());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn legacy_array_payload_is_accepted() {
        let legacy = serde_json::to_vec(&vec![cred("1", "u", "n")]).unwrap();
        let stored: StoredPayload = serde_json::from_slice(&legacy).unwrap();
        let payload = VaultPayload::from(stored);
        assert_eq!(payload.credentials.len(), 1);
        assert!(payload.credit_cards.is_empty());
    }

    #[test]
    fn contains_login_is_exact_match() {
        let mut vault = Vault::empty([0u8; SALT_LEN]);
        vault.credentials.push(cred("1", "https://a.com", "alice"));
        assert!(vault.contains_login("https://a.com", "alice"));
        assert!(!vault.contains_login("https://a.com/", "alice"));
        assert!(!vault.contains_login("https://a.com", "Alice"));
    }

    #[test]
    fn wipe_clears_everything() {
        let mut vault = Vault::empty([0u8; SALT_LEN]);
        vault.credentials.push(cred("1", "u", "n"));
        vault.wipe();
        assert!(vault.credentials.is_empty());
    }
}
