//! Messages exchanged with the browser extension.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::VaultError;
use crate::ipc::protocol::credential_input;
use crate::ipc::VaultRequest;

/// An incoming message: `{type, id?, data?}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

/// What the browser asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeRequest {
    Ping,
    /// Anything that needs the vault.
    Vault(VaultRequest),
}

impl NativeRequest {
    /// The `type` of the response to this request.
    pub fn response_type(&self) -> &'static str {
        match self {
            Self::Ping => "pong",
            Self::Vault(VaultRequest::Search { .. }) => "credentials",
            Self::Vault(VaultRequest::Save(_)) => "saved",
            Self::Vault(VaultRequest::GetCreditCards) => "creditCards",
        }
    }
}

impl TryFrom<&NativeMessage> for NativeRequest {
    type Error = VaultError;

    fn try_from(msg: &NativeMessage) -> Result<Self, Self::Error> {
        let empty = Map::new();
        let data = msg.data.as_ref().unwrap_or(&empty);
        match msg.kind.as_str() {
            "ping" => Ok(Self::Ping),
            "getCredentials" => Ok(Self::Vault(VaultRequest::Search {
                url: data
                    .get("url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })),
            "saveCredential" => Ok(Self::Vault(VaultRequest::Save(credential_input(data)))),
            "getCreditCards" => Ok(Self::Vault(VaultRequest::GetCreditCards)),
            other => Err(VaultError::Protocol(format!(
                "Unknown message type: {other}"
            ))),
        }
    }
}

/// An outgoing response: `{type, id?, success, data?, error?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NativeResponse {
    pub fn success(kind: &str, id: Option<i64>, data: Option<Map<String, Value>>) -> Self {
        Self {
            kind: kind.to_string(),
            id,
            success: true,
            data,
            error: None,
        }
    }

    pub fn failure(kind: &str, id: Option<i64>, error: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            id,
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn pong(id: Option<i64>) -> Self {
        let mut data = Map::new();
        data.insert("status".into(), Value::String("alive".into()));
        Self::success("pong", id, Some(data))
    }

    /// `{type: "error"}` response for messages that could not be handled at all.
    pub fn error(id: Option<i64>, error: impl Into<String>) -> Self {
        Self::failure("error", id, error)
    }
}

/// A one-entry `data` object.
pub(crate) fn data_with(key: &str, value: Value) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert(key.to_string(), value);
    data
}
