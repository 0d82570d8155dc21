//! Per-session protocol engine.
//!
//! One [`ProtocolEngine`] is built for every accepted streaming connection
//! and bound to the backend resolved for that connection's credential. It
//! matches decoded JSON-RPC messages to the discovery (`tools/list`) and
//! invocation (`tools/call`) handlers, plus the protocol housekeeping methods
//! (`initialize`, `ping`), and writes every response onto its own session
//! channel. Engines are never shared between sessions.

use crate::bridge::events::EventSender;
use crate::capability::BackendHandle;
use crate::error::{Error, Result};
use crate::protocol::json_rpc::{JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, error_codes};

use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing;

/// Protocol revision reported when the client asks for none or for one the
/// bridge does not speak
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Protocol revisions the bridge echoes back during `initialize`
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-03-26", "2024-11-05", "2024-10-07"];

/// `serverInfo` reported during `initialize`
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Dispatches one session's messages to the handlers bound to its backend.
pub struct ProtocolEngine {
    backend: BackendHandle,
    outbound: EventSender,
    identity: ServerIdentity,
    invocation_timeout: Duration,
}

impl ProtocolEngine {
    /// Bind a new engine to `backend`, replying on `outbound`
    pub fn new(
        backend: BackendHandle,
        outbound: EventSender,
        identity: ServerIdentity,
        invocation_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            outbound,
            identity,
            invocation_timeout,
        }
    }

    /// Handle one decoded client message.
    ///
    /// Requests produce exactly one response on the session channel;
    /// notifications and client-side responses produce none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Communication`] if the session's stream closed before
    /// the response could be delivered. The response is discarded.
    pub async fn handle(&self, message: JsonRpcMessage) -> Result<()> {
        match message {
            JsonRpcMessage::Request(request) => {
                let response = self.dispatch(request).await;
                self.outbound.send_response(&response).await
            }
            JsonRpcMessage::Notification(notification) => {
                tracing::debug!(method = %notification.method, "Received notification");
                Ok(())
            }
            JsonRpcMessage::Response(response) => {
                tracing::debug!(
                    id = %response.id,
                    "Ignoring client response; the bridge issues no server-side requests"
                );
                Ok(())
            }
        }
    }

    /// Produce the response for one request without sending it
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        tracing::debug!(req_id = %id, method = %method, "Dispatching request");

        let outcome = match method.as_str() {
            "initialize" => Ok(self.initialize(params.as_ref())),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(params).await,
            other => {
                tracing::warn!(method = %other, "Unknown method received");
                return JsonRpcResponse::error(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method '{}' not found", other),
                    None,
                );
            }
        };

        match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                tracing::warn!(req_id = %id, method = %method, error = %e, "Request failed");
                JsonRpcResponse::error(id, error_code(&e), e.to_string(), None)
            }
        }
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let protocol_version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .filter(|requested| SUPPORTED_PROTOCOL_VERSIONS.contains(requested))
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": self.identity.name,
                "version": self.identity.version
            }
        })
    }

    fn list_tools(&self) -> Value {
        json!({ "tools": self.backend.list_operations() })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value> {
        let params = params.ok_or_else(|| Error::JsonRpc("Missing params in tools/call request".to_string()))?;
        let CallToolParams { name, arguments } = serde_json::from_value(params)
            .map_err(|e| Error::JsonRpc(format!("Invalid tools/call params: {}", e)))?;
        let arguments = arguments.unwrap_or_else(|| json!({}));

        tracing::info!(tool = %name, "Invoking tool");

        match tokio::time::timeout(self.invocation_timeout, self.backend.invoke(&name, arguments)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "Tool '{}' did not complete within {:?}",
                name, self.invocation_timeout
            ))),
        }
    }
}

/// JSON-RPC error code reported for a failed request
pub fn error_code(error: &Error) -> i32 {
    match error {
        Error::JsonRpc(_) | Error::ToolNotFound(_) | Error::InvalidArguments(_) => {
            error_codes::INVALID_PARAMS
        }
        Error::InvalidMessage(_) => error_codes::INVALID_REQUEST,
        Error::Serialization(_) => error_codes::PARSE_ERROR,
        _ => error_codes::INTERNAL_ERROR,
    }
}
