//! Session registry for open streaming connections.
//!
//! The registry is the single source of truth mapping a session id to its
//! [`SessionChannel`]. Entries are inserted when a stream is accepted and
//! removed by the [`SessionGuard`] owned by that stream, so a session is
//! unregistered exactly once however the connection ends: explicit close,
//! error, abrupt disconnect, or shutdown.

use crate::bridge::types::{SSEMessage, SessionId};
use crate::error::{Error, Result};
use crate::protocol::engine::ProtocolEngine;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tracing;
use uuid::Uuid;

/// Everything needed to dispatch for one open session
#[derive(Clone)]
pub struct SessionChannel {
    engine: Arc<ProtocolEngine>,
    in_flight: Arc<Semaphore>,
}

impl SessionChannel {
    /// Wrap a session's engine, admitting at most `max_in_flight` messages
    /// that have not yet been answered
    pub fn new(engine: Arc<ProtocolEngine>, max_in_flight: usize) -> Self {
        Self {
            engine,
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
        }
    }

    /// The engine bound to this session's backend
    pub fn engine(&self) -> Arc<ProtocolEngine> {
        self.engine.clone()
    }

    /// Reserve a slot for one more message.
    ///
    /// The slot is released when the returned permit is dropped, after the
    /// message's response has been queued or discarded.
    ///
    /// # Errors
    ///
    /// [`Error::SessionBusy`] when the client has stopped draining its
    /// stream and every slot is taken.
    pub fn admit(&self, session_id: &str) -> Result<OwnedSemaphorePermit> {
        self.in_flight
            .clone()
            .try_acquire_owned()
            .map_err(|_| Error::SessionBusy(session_id.to_string()))
    }
}

/// Maps session ids to open channels
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionChannel>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `channel` under a freshly generated id.
    ///
    /// The id is unique among currently registered sessions.
    pub fn register(&self, channel: SessionChannel) -> SessionId {
        loop {
            let session_id = Uuid::new_v4().to_string();
            match self.sessions.entry(session_id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(channel);
                    return session_id;
                }
                Entry::Occupied(_) => {
                    tracing::warn!(session_id = %session_id, "Session id collision, drawing another");
                }
            }
        }
    }

    /// Find the channel for `session_id`
    ///
    /// # Errors
    ///
    /// [`Error::UnknownSession`] if the id was never issued or is closed.
    pub fn lookup(&self, session_id: &str) -> Result<SessionChannel> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::UnknownSession(session_id.to_string()))
    }

    /// Remove `session_id`; returns whether it was registered
    pub fn unregister(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Whether `session_id` is currently registered
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Number of open sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is open
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every session channel, ending all open streams once their
    /// in-flight work finishes
    pub fn close_all(&self) {
        let count = self.sessions.len();
        self.sessions.clear();
        tracing::info!(closed_sessions = count, "Closed all SSE sessions");
    }
}

/// Unregisters its session when dropped
pub struct SessionGuard {
    session_id: SessionId,
    registry: Arc<SessionRegistry>,
}

impl SessionGuard {
    /// Guard `session_id` in `registry`
    pub fn new(session_id: SessionId, registry: Arc<SessionRegistry>) -> Self {
        Self {
            session_id,
            registry,
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let removed = self.registry.unregister(&self.session_id);
        tracing::info!(
            session_id = %self.session_id,
            removed,
            active_sessions = self.registry.len(),
            "SSE connection closed"
        );
    }
}

/// The server-to-client leg of one session.
///
/// Yields the session's events in send order. Dropping it closes the
/// session.
pub struct SessionStream {
    session_id: SessionId,
    receiver: mpsc::Receiver<SSEMessage>,
    _guard: SessionGuard,
}

impl SessionStream {
    /// Wrap a session's receiver and guard
    pub fn new(
        session_id: SessionId,
        receiver: mpsc::Receiver<SSEMessage>,
        guard: SessionGuard,
    ) -> Self {
        Self {
            session_id,
            receiver,
            _guard: guard,
        }
    }

    /// Id of the session this stream belongs to
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Stream for SessionStream {
    type Item = SSEMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
