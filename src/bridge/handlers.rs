//! HTTP request handlers for the Actix Web-based SSE bridge.
//!
//! This module contains the Actix Web handlers for the bridge endpoints:
//! - the SSE route (default `/sse`) for opening a session stream
//! - the messages route (default `/messages`) for receiving client JSON-RPC messages

use crate::bridge::Bridge;
use crate::bridge::credential::bearer_token;
use crate::bridge::events::{format_sse_message, keep_alive_frame};
use crate::bridge::session::SessionStream;
use crate::bridge::types::{MessageQuery, SseQuery};
use crate::error::{Error, Result};

use actix_web::{
    HttpRequest, HttpResponse,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    web::{self, Bytes, Data},
};
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::time::{Instant, interval_at};
use tracing;

/// Turn a session stream into SSE wire frames, interleaving keep-alive
/// comments while the session is idle
fn event_stream(
    mut session: SessionStream,
    keep_alive: Duration,
) -> impl Stream<Item = std::result::Result<Bytes, actix_web::Error>> {
    async_stream::stream! {
        let mut ticker = interval_at(Instant::now() + keep_alive, keep_alive);
        loop {
            let frame = tokio::select! {
                message = session.next() => message.map(|msg| {
                    tracing::trace!(
                        session_id = %session.session_id(),
                        event_type = %msg.event,
                        "Sending SSE event to client"
                    );
                    format_sse_message(&msg)
                }),
                _ = ticker.tick() => Some(keep_alive_frame()),
            };

            match frame {
                Some(bytes) => yield Ok::<_, actix_web::Error>(bytes),
                None => {
                    tracing::debug!(session_id = %session.session_id(), "Session channel closed, ending stream");
                    break;
                }
            }
        }
    }
}

/// SSE entrypoint handler
///
/// Opens a session for the caller and streams its events. The first event
/// names the endpoint the client must post its messages to.
///
/// # Returns
///
/// An HTTP response with an SSE stream, or a plain-text error before any
/// streaming begins
pub async fn sse_endpoint(
    bridge: Data<Bridge>,
    query: web::Query<SseQuery>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    tracing::debug!(
        method = %req.method(),
        path = %req.path(),
        "Client connected to SSE endpoint"
    );

    let supplied = query.api_key.as_deref().or_else(|| bearer_token(&req));
    let session = bridge.connect(supplied).await?;
    let stream = event_stream(session, bridge.config().keep_alive());

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(stream))
}

/// Handle messages from clients
///
/// Accepts one JSON-RPC message for the session named by `sessionId`. The
/// response travels over that session's stream, not in this HTTP response.
///
/// # Returns
///
/// `202 Accepted` once the message is handed to the session's engine
pub async fn post_message(
    bridge: Data<Bridge>,
    query: web::Query<MessageQuery>,
    body: Bytes,
) -> Result<HttpResponse> {
    let session_id = query.session_id.as_deref().ok_or_else(|| {
        tracing::warn!("Message posted without sessionId");
        Error::InvalidMessage("Missing sessionId query parameter".to_string())
    })?;

    bridge.post_message(session_id, &body).await?;

    Ok(HttpResponse::Accepted()
        .content_type("text/plain; charset=utf-8")
        .body("Accepted"))
}
