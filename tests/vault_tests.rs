//! Integration tests for the VaultZero vault module: storage and the
//! session state machine.

use std::fs;
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

use vaultzero::crypto::{derive_key_with_params, KdfParams};
use vaultzero::errors::VaultError;
use vaultzero::vault::{CredentialInput, CreditCardInput, Vault, VaultSession, VaultStore};
use tempfile::TempDir;

fn fast_params() -> KdfParams {
    KdfParams::new(8_192, 1, 1).unwrap()
}

fn session_in(dir: &TempDir) -> VaultSession {
    VaultSession::with_kdf_params(VaultStore::new(dir.path()), fast_params())
}

fn github() -> CredentialInput {
    CredentialInput {
        service_name: "GitHub".into(),
        url: "https://github.com/login".into(),
        username: "alice".into(),
        password: "p@ss".into(),
        category: "Work".into(),
    }
}

fn login(service: &str, url: &str, user: &str) -> CredentialInput {
    CredentialInput {
        service_name: service.into(),
        url: url.into(),
        username: user.into(),
        password: "pw".into(),
        category: String::new(),
    }
}

fn visa() -> CreditCardInput {
    CreditCardInput {
        card_name: "Personal Visa".into(),
        cardholder_name: "Alice Doe".into(),
        card_number: "4111111111111111".into(),
        expiry_month: "08".into(),
        expiry_year: "2030".into(),
        cvv: "123".into(),
        card_type: "visa".into(),
        billing_zip: "94107".into(),
    }
}

// ---------------------------------------------------------------------------
// Create / lock / unlock
// ---------------------------------------------------------------------------

#[test]
fn create_add_lock_unlock_roundtrip() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);

    session.create("correct-horse-battery").unwrap();
    let added = session.add_credential(github()).unwrap();
    session.lock();
    assert!(!session.is_unlocked());

    session.unlock("correct-horse-battery").unwrap();
    let all = session.credentials().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], added);
    assert_eq!(all[0].service_name, "GitHub");
    assert_eq!(all[0].url, "https://github.com/login");
    assert_eq!(all[0].username, "alice");
    assert_eq!(all[0].password, "p@ss");
}

#[test]
fn wrong_password_fails_and_stays_locked() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("correct-horse-battery").unwrap();
    session.lock();

    let err = session.unlock("wrong").unwrap_err();
    assert!(matches!(err, VaultError::Authentication));
    assert_eq!(err.to_string(), "invalid master password or corrupted vault");
    assert!(!session.is_unlocked());
}

#[test]
fn failed_unlock_keeps_an_open_session_open() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("correct-horse-battery").unwrap();

    assert!(session.unlock("wrong").is_err());
    assert!(session.is_unlocked());
}

#[test]
fn create_refuses_existing_vault() {
    let dir = TempDir::new().unwrap();
    session_in(&dir).create("first-password").unwrap();

    let second = session_in(&dir);
    assert!(matches!(
        second.create("second-password"),
        Err(VaultError::VaultAlreadyExists(_))
    ));
}

#[test]
fn unlock_without_vault_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = session_in(&dir).unlock("whatever").unwrap_err();
    assert!(matches!(err, VaultError::VaultNotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn locked_mutations_fail_and_never_touch_disk() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("correct-horse-battery").unwrap();
    let id = session.add_credential(github()).unwrap().id;
    session.lock();

    let before = fs::read(session.store().vault_path()).unwrap();

    assert!(matches!(session.add_credential(github()), Err(VaultError::Locked)));
    assert!(matches!(session.update_credential(&id, github()), Err(VaultError::Locked)));
    assert!(matches!(session.delete_credential(&id), Err(VaultError::Locked)));
    assert!(matches!(session.toggle_favorite(&id), Err(VaultError::Locked)));
    assert!(matches!(
        session.change_password("correct-horse-battery", "another-password"),
        Err(VaultError::Locked)
    ));
    assert!(matches!(session.search("https://github.com"), Err(VaultError::Locked)));
    assert!(matches!(session.credit_cards(), Err(VaultError::Locked)));

    assert_eq!(fs::read(session.store().vault_path()).unwrap(), before);
}

// ---------------------------------------------------------------------------
// Credential mutations
// ---------------------------------------------------------------------------

#[test]
fn update_keeps_identity_and_favorite() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    let original = session.add_credential(github()).unwrap();
    assert!(session.toggle_favorite(&original.id).unwrap());

    let updated = session
        .update_credential(&original.id, login("GitLab", "https://gitlab.com", "bob"))
        .unwrap();
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.is_favorite);
    assert_eq!(updated.service_name, "GitLab");
    assert!(updated.icon_url.contains("gitlab.com"));
}

#[test]
fn unknown_id_is_not_found_not_locked() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    assert!(matches!(
        session.toggle_favorite("nope"),
        Err(VaultError::CredentialNotFound(_))
    ));
    assert!(matches!(
        session.delete_credential("nope"),
        Err(VaultError::CredentialNotFound(_))
    ));
}

#[test]
fn delete_preserves_order_of_the_rest() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    let a = session.add_credential(login("A", "https://a.com", "a")).unwrap();
    let b = session.add_credential(login("B", "https://b.com", "b")).unwrap();
    let c = session.add_credential(login("C", "https://c.com", "c")).unwrap();

    session.delete_credential(&b.id).unwrap();
    let ids: Vec<_> = session.credentials().unwrap().into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![a.id, c.id]);
}

#[test]
fn mutations_are_persisted_immediately() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    session.add_credential(github()).unwrap();

    // A second session over the same directory sees the write.
    let other = session_in(&dir);
    other.unlock("pw").unwrap();
    assert_eq!(other.credentials().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[test]
fn search_matches_sibling_subdomains() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    session
        .add_credential(login("Google Account", "https://accounts.google.com", "alice"))
        .unwrap();
    session
        .add_credential(login("Bank", "https://mybank.example", "alice"))
        .unwrap();

    let hits = session.search("https://mail.google.com/mail").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].url, "https://accounts.google.com");
}

#[test]
fn search_falls_back_to_service_name() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    session.add_credential(login("GitHub", "", "alice")).unwrap();

    assert_eq!(session.search("https://www.github.com/login").unwrap().len(), 1);
    assert!(session.search("").unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Password change
// ---------------------------------------------------------------------------

#[test]
fn change_password_rekeys_the_vault() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("old-password").unwrap();
    session.add_credential(github()).unwrap();
    let old_salt = session.store().load_salt().unwrap();

    session.change_password("old-password", "new-password").unwrap();
    assert_ne!(session.store().load_salt().unwrap(), old_salt);

    // Mutations after the change use the new key.
    session.add_credential(login("B", "https://b.com", "b")).unwrap();
    session.lock();

    assert!(matches!(session.unlock("old-password"), Err(VaultError::Authentication)));
    session.unlock("new-password").unwrap();
    assert_eq!(session.credentials().unwrap().len(), 2);
}

#[test]
fn change_password_checks_current_then_policy() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("old-password").unwrap();

    assert!(matches!(
        session.change_password("not-it", "new-password"),
        Err(VaultError::Authentication)
    ));
    assert!(matches!(
        session.change_password("old-password", "short"),
        Err(VaultError::Policy(_))
    ));
    session.lock();
    session.unlock("old-password").unwrap();
}

// ---------------------------------------------------------------------------
// Credit cards
// ---------------------------------------------------------------------------

#[test]
fn credit_cards_persist_with_credentials() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    let card = session.add_credit_card(visa()).unwrap();
    session.lock();

    session.unlock("pw").unwrap();
    let cards = session.credit_cards().unwrap();
    assert_eq!(cards, vec![card.clone()]);

    session.delete_credit_card(&card.id).unwrap();
    assert!(session.credit_cards().unwrap().is_empty());
    assert!(matches!(
        session.delete_credit_card(&card.id),
        Err(VaultError::CreditCardNotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// CSV import / export
// ---------------------------------------------------------------------------

const CHROME_CSV: &str = "name,url,username,password\nGitHub,https://github.com,alice,p@ss\n";

#[test]
fn importing_the_same_row_twice_skips_it() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();

    let first = session.import_csv(CHROME_CSV.as_bytes()).unwrap();
    assert_eq!((first.imported, first.skipped), (1, 0));

    let second = session.import_csv(CHROME_CSV.as_bytes()).unwrap();
    assert_eq!(second.total_processed, 1);
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(second.errors, vec!["Skipped duplicate: GitHub (alice)".to_string()]);
    assert_eq!(session.credentials().unwrap().len(), 1);
}

#[test]
fn import_dedupes_within_one_file_and_categorizes() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();

    let csv = "name,url,username,password\n\
               Reddit,https://reddit.com,bob,a\n\
               Reddit,https://reddit.com,bob,b\n";
    let report = session.import_csv(csv.as_bytes()).unwrap();
    assert_eq!((report.imported, report.skipped), (1, 1));

    let creds = session.credentials().unwrap();
    assert_eq!(creds[0].category, "Social");
    assert_eq!(creds[0].password, "a");
}

#[test]
fn import_with_nothing_new_does_not_rewrite_the_vault() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    session.import_csv(CHROME_CSV.as_bytes()).unwrap();

    let before = fs::read(session.store().vault_path()).unwrap();
    session.import_csv(CHROME_CSV.as_bytes()).unwrap();
    assert_eq!(fs::read(session.store().vault_path()).unwrap(), before);
}

#[test]
fn export_csv_writes_fixed_header() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    session.add_credential(github()).unwrap();

    let out = dir.path().join("export.csv");
    assert_eq!(session.export_csv(&out).unwrap(), 1);
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(
        text,
        "name,url,username,password\nGitHub,https://github.com/login,alice,p@ss\n"
    );
}

// ---------------------------------------------------------------------------
// Encrypted backups
// ---------------------------------------------------------------------------

#[test]
fn backup_restore_brings_back_deleted_entries() {
    let source_dir = TempDir::new().unwrap();
    let source = session_in(&source_dir);
    source.create("shared-password").unwrap();
    source.add_credential(github()).unwrap();
    let backup = source_dir.path().join("vault.backup");
    source.export_backup(&backup).unwrap();

    // Sealed with the session key, so only this vault can open it.
    let id = source.credentials().unwrap()[0].id.clone();
    source.delete_credential(&id).unwrap();
    let report = source.import_backup(&backup).unwrap();
    assert_eq!((report.imported, report.skipped), (1, 0));
    assert_eq!(source.credentials().unwrap()[0].id, id);

    let again = source.import_backup(&backup).unwrap();
    assert_eq!((again.imported, again.skipped), (0, 1));
}

#[test]
fn backup_refuses_live_vault_path() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    let live = session.store().vault_path().to_path_buf();
    assert!(session.export_backup(&live).is_err());
    session.lock();
    session.unlock("pw").unwrap();
}

// ---------------------------------------------------------------------------
// VaultStore directly
// ---------------------------------------------------------------------------

#[test]
fn store_load_reports_parse_errors_separately() {
    let dir = TempDir::new().unwrap();
    let store = VaultStore::new(dir.path());
    let salt = [5u8; 32];
    let key = derive_key_with_params(b"pw", &salt, &fast_params()).unwrap();

    store.save_salt(&salt).unwrap();
    let sealed = vaultzero::crypto::encrypt(&key, b"{not json").unwrap();
    fs::write(store.vault_path(), sealed).unwrap();

    assert!(matches!(store.load(&key, salt), Err(VaultError::Parse(_))));
}

#[test]
fn store_save_load_preserves_order() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    for i in 0..5 {
        session
            .add_credential(login(&format!("S{i}"), &format!("https://s{i}.com"), "u"))
            .unwrap();
    }
    let expected = session.credentials().unwrap();

    let store = VaultStore::new(dir.path());
    let salt = store.load_salt().unwrap();
    let key = derive_key_with_params(b"pw", &salt, &fast_params()).unwrap();
    let Vault { credentials, .. } = store.load(&key, salt).unwrap();
    assert_eq!(credentials, expected);
}

#[test]
fn legacy_bare_array_vault_opens() {
    let dir = TempDir::new().unwrap();
    let store = VaultStore::new(dir.path());
    let salt = [9u8; 32];
    let key = derive_key_with_params(b"pw", &salt, &fast_params()).unwrap();

    let legacy = r#"[{"id":"1","serviceName":"Old","url":"https://old.example","username":"u","password":"p","category":"Other","createdAt":"2024-01-01T00:00:00Z"}]"#;
    store.save_salt(&salt).unwrap();
    fs::write(
        store.vault_path(),
        vaultzero::crypto::encrypt(&key, legacy.as_bytes()).unwrap(),
    )
    .unwrap();

    let vault = store.load(&key, salt).unwrap();
    assert_eq!(vault.credentials.len(), 1);
    assert!(vault.credit_cards.is_empty());
    assert!(!vault.credentials[0].is_favorite);
}

#[test]
fn delete_vault_removes_both_files() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    session.create("pw").unwrap();
    session.delete_vault().unwrap();

    assert!(!session.is_unlocked());
    assert!(!session.vault_exists());
    assert!(!session.store().salt_path().exists());
    session.delete_vault().unwrap();
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_writers_do_not_lose_updates() {
    let dir = TempDir::new().unwrap();
    let session = Arc::new(session_in(&dir));
    session.create("pw").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                for i in 0..5 {
                    session
                        .add_credential(login("S", &format!("https://t{t}-{i}.com"), "u"))
                        .unwrap();
                    session.search("https://t0-0.com").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(session.credentials().unwrap().len(), 20);
    session.lock();
    session.unlock("pw").unwrap();
    assert_eq!(session.credentials().unwrap().len(), 20);
}

#[test]
fn reunlocking_does_not_drop_concurrent_writes() {
    let dir = TempDir::new().unwrap();
    let session = Arc::new(session_in(&dir));
    session.create("pw").unwrap();

    let writer = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            for i in 0..30 {
                session
                    .add_credential(login("S", &format!("https://w{i}.com"), "u"))
                    .unwrap();
            }
        })
    };
    for _ in 0..10 {
        session.unlock("pw").unwrap();
    }
    writer.join().unwrap();

    assert_eq!(session.credentials().unwrap().len(), 30);
    // One more write must not persist a stale in-memory copy.
    session.add_credential(login("Last", "https://last.com", "u")).unwrap();
    session.lock();
    session.unlock("pw").unwrap();
    assert_eq!(session.credentials().unwrap().len(), 31);
}

#[test]
fn unlock_after_password_change_elsewhere_uses_the_new_salt() {
    let dir = TempDir::new().unwrap();
    let first = session_in(&dir);
    first.create("old-password").unwrap();
    first.add_credential(github()).unwrap();

    let second = session_in(&dir);
    second.unlock("old-password").unwrap();
    first.change_password("old-password", "new-password").unwrap();

    assert!(matches!(second.unlock("old-password"), Err(VaultError::Authentication)));
    assert!(second.is_unlocked());
    second.unlock("new-password").unwrap();
    assert_eq!(second.credentials().unwrap().len(), 1);
}

#[test]
fn concurrent_creates_produce_exactly_one_vault() {
    let dir = TempDir::new().unwrap();
    let session = Arc::new(session_in(&dir));
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["first-password", "second-password"]
        .into_iter()
        .map(|password| {
            let session = Arc::clone(&session);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (password, session.create(password))
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<_> = results.iter().filter(|(_, r)| r.is_ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(results
        .iter()
        .any(|(_, r)| matches!(r, Err(VaultError::VaultAlreadyExists(_)))));

    // The salt on disk belongs to the vault that won.
    let winner = winners[0].0;
    session.lock();
    let reopened = session_in(&dir);
    reopened.unlock(winner).unwrap();
}
