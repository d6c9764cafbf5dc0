//! The vault's local wire protocol.
//!
//! One newline-terminated JSON request per connection:
//!
//! ```text
//! {"action":"search","url":"https://github.com/login"}
//! {"action":"save","data":{"serviceName":..,"url":..,"username":..,"password":..,"category":..}}
//! {"action":"getCreditCards"}
//! ```
//!
//! answered by one JSON response line
//! `{"success":bool,"credentials"?:[..],"creditCards"?:[..],"error"?:".."}`.
//!
//! Requests arrive as `RawRequest` and are validated into the closed
//! `VaultRequest` enum before anything touches the session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::VaultError;
use crate::vault::{Credential, CredentialInput, CreditCard, DEFAULT_CATEGORY};

/// Failure text for a request line that is not a JSON request object.
pub const INVALID_REQUEST: &str = "Invalid request format";

/// A request exactly as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRequest {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

/// A validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultRequest {
    Search { url: String },
    Save(CredentialInput),
    GetCreditCards,
}

impl VaultRequest {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::Save(_) => "save",
            Self::GetCreditCards => "getCreditCards",
        }
    }
}

impl TryFrom<RawRequest> for VaultRequest {
    type Error = VaultError;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        match raw.action.as_str() {
            "search" => Ok(Self::Search {
                url: raw.url.unwrap_or_default(),
            }),
            "save" => Ok(Self::Save(credential_input(
                &raw.data.unwrap_or_default(),
            ))),
            "getCreditCards" => Ok(Self::GetCreditCards),
            other => Err(VaultError::Protocol(format!("Unknown action: {other}"))),
        }
    }
}

/// Pull the credential fields out of a `save` payload.
///
/// Missing or non-string values count as empty; an empty category
/// becomes the default one.
pub fn credential_input(data: &Map<String, Value>) -> CredentialInput {
    let field = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let mut category = field("category");
    if category.is_empty() {
        category = DEFAULT_CATEGORY.to_string();
    }
    CredentialInput {
        service_name: field("serviceName"),
        url: field("url"),
        username: field("username"),
        password: field("password"),
        category,
    }
}

impl From<&VaultRequest> for RawRequest {
    fn from(request: &VaultRequest) -> Self {
        match request {
            VaultRequest::Search { url } => Self {
                action: request.action().into(),
                url: Some(url.clone()),
                data: None,
            },
            VaultRequest::Save(input) => {
                let data = [
                    ("serviceName", &input.service_name),
                    ("url", &input.url),
                    ("username", &input.username),
                    ("password", &input.password),
                    ("category", &input.category),
                ]
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                .collect();
                Self {
                    action: request.action().into(),
                    url: None,
                    data: Some(data),
                }
            }
            VaultRequest::GetCreditCards => Self {
                action: request.action().into(),
                ..Self::default()
            },
        }
    }
}

/// The single response to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Vec<Credential>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_cards: Option<Vec<CreditCard>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VaultResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn with_credentials(credentials: Vec<Credential>) -> Self {
        Self {
            success: true,
            credentials: Some(credentials),
            ..Self::default()
        }
    }

    pub fn with_credit_cards(cards: Vec<CreditCard>) -> Self {
        Self {
            success: true,
            credit_cards: Some(cards),
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

impl From<&VaultError> for VaultResponse {
    fn from(err: &VaultError) -> Self {
        match err {
            // Keep the wire text free of the "Protocol error:" prefix.
            VaultError::Protocol(message) => Self::failure(message.clone()),
            other => Self::failure(other.to_string()),
        }
    }
}

/// Parse one request line.  Whitespace around the JSON is ignored.
pub fn parse_request(line: &str) -> Result<VaultRequest, VaultError> {
    let raw: RawRequest = serde_json::from_str(line.trim())
        .map_err(|_| VaultError::Protocol(INVALID_REQUEST.into()))?;
    VaultRequest::try_from(raw)
}

/// Serialize a value as one protocol line (JSON plus `\n`).
pub fn encode_line<T: Serialize>(value: &T) -> Result<Vec<u8>, VaultError> {
    let mut line = serde_json::to_vec(value)
        .map_err(|e| VaultError::Serialization(format!("IPC message: {e}")))?;
    line.push(b'\n');
    Ok(line)
}
