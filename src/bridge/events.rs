//! SSE event delivery for a single session.
//!
//! Each session owns a bounded `tokio::sync::mpsc` queue. The [`EventSender`]
//! half is shared by the session's protocol engine and the bridge; the
//! receiver half is drained by the session's HTTP stream, which formats each
//! [`SSEMessage`] for the wire. A single consumer per queue keeps messages in
//! send order.

use crate::error::{Error, Result};
use crate::bridge::types::SSEMessage;
use crate::protocol::json_rpc::JsonRpcResponse;
use actix_web::web::Bytes;
use tokio::sync::mpsc;
use tracing;

/// Event name of the handshake message carrying the post endpoint
pub const ENDPOINT_EVENT: &str = "endpoint";
/// Event name of JSON-RPC messages
pub const MESSAGE_EVENT: &str = "message";

/// Sending half of one session's event queue
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: mpsc::Sender<SSEMessage>,
}

impl EventSender {
    /// Create a session queue holding up to `capacity` undelivered events
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SSEMessage>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Send the handshake event telling the client where to post messages.
    ///
    /// The data is the bare URL path, not JSON.
    pub async fn send_endpoint(&self, endpoint_url: &str) -> Result<()> {
        tracing::debug!(
            event = ENDPOINT_EVENT,
            data = %endpoint_url,
            "Sending message endpoint to client"
        );

        let message = SSEMessage::new(ENDPOINT_EVENT, endpoint_url, None);
        self.send_sse_message(message, ENDPOINT_EVENT).await
    }

    /// Send a JSON-RPC response as a `message` event
    pub async fn send_response(&self, response: &JsonRpcResponse) -> Result<()> {
        let json_data = serde_json::to_string(response).map_err(|e| {
            tracing::error!(error = %e, req_id = %response.id, "Failed to serialize JSON-RPC response");
            Error::Serialization(e.to_string())
        })?;

        tracing::debug!(
            req_id = %response.id,
            success = response.is_success(),
            "Sending JSON-RPC response via SSE"
        );

        let message = SSEMessage::new(MESSAGE_EVENT, &json_data, None);
        self.send_sse_message(message, MESSAGE_EVENT).await
    }

    async fn send_sse_message(&self, message: SSEMessage, event_type_name: &str) -> Result<()> {
        self.sender.send(message).await.map_err(|_| {
            tracing::debug!(
                event_type = event_type_name,
                "Session stream closed; dropping SSE event"
            );
            Error::Communication("Session stream is closed".to_string())
        })
    }
}

/// Format an SSEMessage for the wire
///
/// Multi-line data is split over several `data:` fields so the client
/// reassembles it unchanged.
pub fn format_sse_message(message: &SSEMessage) -> Bytes {
    let mut result = String::new();

    if let Some(id) = &message.id {
        result.push_str(&format!("id: {}\n", id));
    }

    result.push_str(&format!("event: {}\n", message.event));
    for line in message.data.split('\n') {
        result.push_str(&format!("data: {}\n", line));
    }
    result.push('\n');

    Bytes::from(result)
}

/// SSE comment frame that keeps idle connections open
pub fn keep_alive_frame() -> Bytes {
    Bytes::from_static(b": keep-alive\n\n")
}
