//! Type definitions for the SSE bridge.
//!
//! This module contains the core data structures shared by the bridge's
//! session handling and HTTP handlers.

use serde::{Deserialize, Serialize};

/// Opaque identifier of one open streaming connection.
pub type SessionId = String;

/// Server-Sent Event message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SSEMessage {
    /// Event type
    pub event: String,
    /// Event data
    pub data: String,
    /// Optional event ID
    pub id: Option<String>,
}

impl SSEMessage {
    /// Creates a new SSE message with the given event type, data payload, and optional ID
    ///
    /// # Arguments
    ///
    /// * `event` - The event type (e.g., "endpoint", "message")
    /// * `data` - The data payload
    /// * `id` - Optional event ID
    pub fn new(event: &str, data: &str, id: Option<&str>) -> Self {
        Self {
            event: event.to_string(),
            data: data.to_string(),
            id: id.map(String::from),
        }
    }
}

/// Query string accepted when opening a stream
#[derive(Debug, Default, Deserialize)]
pub struct SseQuery {
    /// Per-connection credential (multi-tenant mode)
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
}

/// Query string accepted when posting a message
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    /// Session the message belongs to
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}
