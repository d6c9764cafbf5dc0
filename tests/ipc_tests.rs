//! End-to-end tests for the IPC channel: a live server over a unix
//! socket in a temp directory, driven by `VaultClient` and by raw lines.
#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use vaultzero::crypto::KdfParams;
use vaultzero::errors::VaultError;
use vaultzero::ipc::{IpcServer, ServerConfig, ServerHandle, VaultClient, VaultResponse};
use vaultzero::vault::{CredentialInput, CreditCardInput, VaultSession, VaultStore};

struct Fixture {
    dir: TempDir,
    session: Arc<VaultSession>,
    server: ServerHandle,
}

impl Fixture {
    async fn start(unlocked: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(VaultSession::with_kdf_params(
            VaultStore::new(dir.path().join("data")),
            KdfParams::new(8_192, 1, 1).unwrap(),
        ));
        session.create("correct-horse-battery").unwrap();
        session
            .add_credential(CredentialInput {
                service_name: "Google Account".into(),
                url: "https://accounts.google.com".into(),
                username: "alice@gmail.com".into(),
                password: "hunter22".into(),
                category: "Personal".into(),
            })
            .unwrap();
        session
            .add_credential(CredentialInput {
                service_name: "Bank".into(),
                url: "https://mybank.example".into(),
                username: "alice".into(),
                password: "s3cret".into(),
                category: "Finance".into(),
            })
            .unwrap();
        if !unlocked {
            session.lock();
        }

        let config = ServerConfig {
            channel_path: dir.path().join("run").join("vz.sock"),
            max_connections: 4,
            request_timeout: Duration::from_secs(2),
        };
        let server = IpcServer::new(Arc::clone(&session), config)
            .start()
            .await
            .unwrap();
        Self {
            dir,
            session,
            server,
        }
    }

    fn client(&self) -> VaultClient {
        VaultClient::new(self.server.channel_path())
            .with_connect_timeout(Duration::from_millis(500))
            .with_retry_interval(Duration::from_millis(20))
            .with_response_timeout(Duration::from_secs(2))
    }

    /// Send one raw line and read the one response line.
    async fn raw(&self, line: &str) -> VaultResponse {
        let mut stream = UnixStream::connect(self.server.channel_path()).await.unwrap();
        stream.write_all(line.as_bytes()).await.unwrap();
        let mut reader = BufReader::new(stream);
        let mut response = String::new();
        reader.read_line(&mut response).await.unwrap();
        serde_json::from_str(&response).unwrap()
    }
}

#[tokio::test]
async fn search_matches_sibling_subdomain() {
    let fx = Fixture::start(true).await;
    let creds = fx.client().search("https://mail.google.com/mail").await.unwrap();

    assert_eq!(creds.len(), 1);
    assert_eq!(creds[0].service_name, "Google Account");
    assert_eq!(creds[0].username, "alice@gmail.com");
    assert_eq!(creds[0].password, "hunter22");

    fx.server.stop().await.unwrap();
}

#[tokio::test]
async fn search_response_uses_wire_field_names() {
    let fx = Fixture::start(true).await;
    let mut stream = UnixStream::connect(fx.server.channel_path()).await.unwrap();
    stream
        .write_all(b"{\"action\":\"search\",\"url\":\"https://mybank.example/login\"}\n")
        .await
        .unwrap();
    let mut line = String::new();
    BufReader::new(stream).read_line(&mut line).await.unwrap();

    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["credentials"][0]["serviceName"], "Bank");
    assert!(value["credentials"][0]["iconURL"]
        .as_str()
        .unwrap()
        .contains("mybank.example"));
    assert!(value.get("error").is_none());
}

#[tokio::test]
async fn locked_vault_answers_with_failure() {
    let fx = Fixture::start(false).await;
    let response = fx.raw("{\"action\":\"search\",\"url\":\"https://google.com\"}\n").await;
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Vault is locked"));

    let err = fx.client().search("https://google.com").await.unwrap_err();
    assert!(err.to_string().contains("Vault is locked"));
}

#[tokio::test]
async fn every_action_is_refused_while_locked_and_disk_is_untouched() {
    let fx = Fixture::start(false).await;
    let vault_file = fx.session.store().vault_path().to_path_buf();
    let before = std::fs::read(&vault_file).unwrap();

    let save = fx
        .raw(concat!(
            r#"{"action":"save","data":{"serviceName":"Example","url":"https://example.org","#,
            r#""username":"bob","password":"pw"}}"#,
            "\n"
        ))
        .await;
    assert!(!save.success);
    assert_eq!(save.error.as_deref(), Some("Vault is locked"));

    let cards = fx.raw("{\"action\":\"getCreditCards\"}\n").await;
    assert!(!cards.success);
    assert_eq!(cards.error.as_deref(), Some("Vault is locked"));

    assert_eq!(std::fs::read(&vault_file).unwrap(), before);
    fx.session.unlock("correct-horse-battery").unwrap();
    assert_eq!(fx.session.credentials().unwrap().len(), 2);
}

#[tokio::test]
async fn save_appends_to_the_vault() {
    let fx = Fixture::start(true).await;
    fx.client()
        .save(CredentialInput {
            service_name: "Example".into(),
            url: "https://example.org".into(),
            username: "bob".into(),
            password: "pw".into(),
            category: String::new(),
        })
        .await
        .unwrap();

    let creds = fx.session.credentials().unwrap();
    assert_eq!(creds.len(), 3);
    assert_eq!(creds[2].username, "bob");
    assert_eq!(creds[2].category, "Other");
}

#[tokio::test]
async fn credit_cards_are_served() {
    let fx = Fixture::start(true).await;
    fx.session
        .add_credit_card(CreditCardInput {
            card_name: "Work Amex".into(),
            cardholder_name: "Alice".into(),
            card_number: "378282246310005".into(),
            expiry_month: "01".into(),
            expiry_year: "2031".into(),
            cvv: "1234".into(),
            card_type: "amex".into(),
            billing_zip: String::new(),
        })
        .unwrap();

    let cards = fx.client().credit_cards().await.unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].card_name, "Work Amex");
}

#[tokio::test]
async fn unknown_action_and_garbage_are_rejected() {
    let fx = Fixture::start(true).await;

    let unknown = fx.raw("{\"action\":\"dump\"}\n").await;
    assert!(!unknown.success);
    assert_eq!(unknown.error.as_deref(), Some("Unknown action: dump"));

    let garbage = fx.raw("not json at all\n").await;
    assert!(!garbage.success);
    assert_eq!(garbage.error.as_deref(), Some("Invalid request format"));

    // The server is still serving.
    assert_eq!(fx.client().search("https://google.com").await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_clients_are_all_answered() {
    let fx = Fixture::start(true).await;
    let mut handles = Vec::new();
    for _ in 0..16 {
        let client = fx.client();
        handles.push(tokio::spawn(async move {
            client.search("https://mail.google.com").await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().len(), 1);
    }
}

#[tokio::test]
async fn connecting_to_a_missing_socket_times_out() {
    let dir = TempDir::new().unwrap();
    let client = VaultClient::new(dir.path().join("nobody.sock"))
        .with_connect_timeout(Duration::from_millis(200))
        .with_retry_interval(Duration::from_millis(20));

    let started = Instant::now();
    let err = client.search("https://google.com").await.unwrap_err();
    assert!(matches!(err, VaultError::ConnectionTimeout(_)));
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn client_waits_for_a_late_server() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("late.sock");
    let client = VaultClient::new(&path)
        .with_connect_timeout(Duration::from_secs(3))
        .with_retry_interval(Duration::from_millis(20));

    let session = Arc::new(VaultSession::with_kdf_params(
        VaultStore::new(dir.path().join("data")),
        KdfParams::new(8_192, 1, 1).unwrap(),
    ));
    session.create("correct-horse-battery").unwrap();

    let server_path = path.clone();
    let starter = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        IpcServer::new(
            session,
            ServerConfig {
                channel_path: server_path,
                max_connections: 2,
                request_timeout: Duration::from_secs(2),
            },
        )
        .start()
        .await
        .unwrap()
    });

    assert!(client.search("https://google.com").await.unwrap().is_empty());
    starter.await.unwrap().stop().await.unwrap();
}

#[tokio::test]
async fn silent_server_is_a_connection_timeout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("silent.sock");
    // Bound but never accepted: the connect succeeds via the backlog,
    // no response ever arrives.
    let _listener = tokio::net::UnixListener::bind(&path).unwrap();

    let client = VaultClient::new(&path)
        .with_connect_timeout(Duration::from_millis(200))
        .with_response_timeout(Duration::from_millis(200));
    let err = client.search("https://google.com").await.unwrap_err();
    assert!(matches!(err, VaultError::ConnectionTimeout(_)));
}

#[tokio::test]
async fn stop_removes_the_socket_and_second_bind_fails_while_running() {
    let fx = Fixture::start(true).await;
    let path = fx.server.channel_path().to_path_buf();
    assert!(path.exists());

    let second = IpcServer::new(
        Arc::clone(&fx.session),
        ServerConfig {
            channel_path: path.clone(),
            max_connections: 1,
            request_timeout: Duration::from_secs(1),
        },
    )
    .start()
    .await;
    assert!(second.is_err());

    fx.server.stop().await.unwrap();
    assert!(!path.exists());
    drop(fx.dir);
}
