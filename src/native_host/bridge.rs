//! The stdio relay between the browser extension and the vault.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::errors::{Result, VaultError};
use crate::ipc::{VaultClient, VaultRequest, VaultResponse};

use super::framing::{read_frame, write_frame, MAX_OUTBOUND_FRAME};
use super::message::{data_with, NativeMessage, NativeRequest, NativeResponse};

/// Answers browser messages by relaying them to the vault process.
pub struct NativeHost {
    client: VaultClient,
}

impl NativeHost {
    pub fn new(client: VaultClient) -> Self {
        Self { client }
    }

    /// Serve framed messages until the browser closes the channel or
    /// sends a malformed frame.
    ///
    /// A frame whose JSON cannot be decoded gets an `error` response
    /// and the loop continues.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("native host started");
        loop {
            let frame = match read_frame(&mut reader).await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("browser closed the channel");
                    break;
                }
                Err(e) => {
                    warn!("stopping on unreadable frame: {e}");
                    break;
                }
            };

            let response = match serde_json::from_slice::<NativeMessage>(&frame) {
                Ok(message) => {
                    info!(kind = %message.kind, id = ?message.id, "received");
                    self.handle(message).await
                }
                Err(e) => {
                    warn!("undecodable message: {e}");
                    NativeResponse::error(None, format!("Failed to read message: {e}"))
                }
            };

            if let Err(e) = send(&mut writer, &response).await {
                warn!("failed to send response: {e}");
            }
        }
        Ok(())
    }

    /// Answer one message.
    pub async fn handle(&self, message: NativeMessage) -> NativeResponse {
        let id = message.id;
        let request = match NativeRequest::try_from(&message) {
            Ok(request) => request,
            Err(e) => return NativeResponse::error(id, failure_text(&e)),
        };
        let kind = request.response_type();

        let vault_request = match request {
            NativeRequest::Ping => return NativeResponse::pong(id),
            NativeRequest::Vault(vault_request) => vault_request,
        };

        let response = match self.client.send(&vault_request).await {
            Ok(response) => translate(kind, id, &vault_request, response),
            Err(e) => NativeResponse::failure(kind, id, failure_text(&e)),
        };
        info!(kind, success = response.success, "answered");
        if let Some(error) = &response.error {
            debug!(kind, "failure: {error}");
        }
        response
    }
}

/// Map the vault's `{success, credentials|creditCards|error}` onto the
/// browser's `{type, id, success, data|error}`.
fn translate(
    kind: &str,
    id: Option<i64>,
    request: &VaultRequest,
    response: VaultResponse,
) -> NativeResponse {
    if !response.success {
        let error = response
            .error
            .unwrap_or_else(|| "request failed".to_string());
        return NativeResponse::failure(kind, id, error);
    }

    let data = match request {
        VaultRequest::Search { .. } => {
            let credentials = response.credentials.unwrap_or_default();
            Some(data_with("credentials", to_value(&credentials)))
        }
        VaultRequest::GetCreditCards => {
            let cards = response.credit_cards.unwrap_or_default();
            Some(data_with("cards", to_value(&cards)))
        }
        VaultRequest::Save(_) => None,
    };
    NativeResponse::success(kind, id, data)
}

fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Array(Vec::new()))
}

fn failure_text(err: &VaultError) -> String {
    match err {
        VaultError::Protocol(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Encode and write a response, replacing it with a failure if it is
/// too large for the browser.
async fn send<W>(writer: &mut W, response: &NativeResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let encode = |r: &NativeResponse| {
        serde_json::to_vec(r).map_err(|e| VaultError::Serialization(format!("response: {e}")))
    };

    let mut payload = encode(response)?;
    if payload.len() > MAX_OUTBOUND_FRAME {
        warn!(bytes = payload.len(), "response too large for the browser");
        let replacement = NativeResponse::failure(
            &response.kind,
            response.id,
            format!(
                "Response too large ({} bytes, limit {MAX_OUTBOUND_FRAME})",
                payload.len()
            ),
        );
        payload = encode(&replacement)?;
    }
    write_frame(writer, &payload).await
}
