//! Session-multiplexed SSE transport bridge built on Actix Web.
//!
//! The bridge decouples the two legs of an MCP SSE connection:
//! - `GET /sse` opens the server-to-client stream. The bridge resolves the
//!   caller's backend, builds a protocol engine bound to it, registers the
//!   session and announces the post endpoint as the first event.
//! - `POST /messages?sessionId=…` delivers one client message. The bridge
//!   finds the session, decodes the message and hands it to that session's
//!   engine; the result is streamed back on the session's own stream.
//!
//! [`Bridge`] holds the orchestration and is usable without HTTP;
//! [`handlers`] and [`server`] put it behind Actix Web.

pub use self::server::{BridgeHandle, BridgeServer, configure_routes};
pub use self::session::{SessionChannel, SessionGuard, SessionRegistry, SessionStream};
pub use self::types::{SSEMessage, SessionId};

pub mod actix_error;
pub mod credential;
pub mod events;
pub mod handlers;
pub mod server;
pub mod session;
pub mod types;

use crate::backend::InstanceCache;
use crate::capability::BackendFactory;
use crate::config::BridgeConfig;
use crate::error::Result;
use crate::protocol::engine::{ProtocolEngine, ServerIdentity};
use crate::protocol::json_rpc::JsonRpcMessage;
use self::events::EventSender;

use std::sync::Arc;
use tracing::{self, Instrument};

/// Orchestrates sessions, backends and message routing.
pub struct Bridge {
    config: BridgeConfig,
    instances: InstanceCache,
    sessions: Arc<SessionRegistry>,
}

impl Bridge {
    /// Create a bridge whose backends are built by `factory`
    pub fn new(config: BridgeConfig, factory: Arc<dyn BackendFactory>) -> Self {
        let instances = InstanceCache::new(factory, config.backend_init_timeout());
        Self {
            config,
            instances,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    /// The bridge configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The session registry
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// The per-credential backend cache
    pub fn instances(&self) -> &InstanceCache {
        &self.instances
    }

    /// Accept a new streaming connection.
    ///
    /// Resolves the credential for the configured tenancy mode, obtains the
    /// backend for it, binds a fresh protocol engine to that backend and
    /// registers the session. The returned stream's first event is the
    /// `endpoint` announcement; dropping the stream closes the session.
    ///
    /// # Errors
    ///
    /// * [`crate::Error::MissingCredential`] when multi-tenant and nothing was supplied
    /// * [`crate::Error::BackendConstruction`] or [`crate::Error::Timeout`] when
    ///   the backend cannot be built
    ///
    /// No session is registered on error.
    #[tracing::instrument(skip_all)]
    pub async fn connect(&self, supplied_credential: Option<&str>) -> Result<SessionStream> {
        tracing::debug!("New SSE connection request received");

        let credential = credential::resolve_credential(&self.config.tenancy, supplied_credential)?;
        let backend = self.instances.get_or_create(&credential).await.map_err(|e| {
            tracing::error!(error = %e, "Error establishing SSE connection");
            e
        })?;

        let (outbound, receiver) = EventSender::channel(self.config.channel_capacity);
        let engine = ProtocolEngine::new(
            backend,
            outbound.clone(),
            ServerIdentity {
                name: self.config.server_name.clone(),
                version: self.config.server_version.clone(),
            },
            self.config.invocation_timeout(),
        );

        let session_id = self
            .sessions
            .register(SessionChannel::new(Arc::new(engine), self.config.channel_capacity));
        let guard = SessionGuard::new(session_id.clone(), self.sessions.clone());

        tracing::info!(
            session_id = %session_id,
            active_sessions = self.sessions.len(),
            "SSE connection established"
        );

        let endpoint = format!("{}?sessionId={}", self.config.messages_path, session_id);
        outbound.send_endpoint(&endpoint).await?;

        Ok(SessionStream::new(session_id, receiver, guard))
    }

    /// Route one posted client message to its session.
    ///
    /// Returns once the message is decoded and handed to the session's
    /// engine; the engine's response arrives on the session stream.
    ///
    /// # Errors
    ///
    /// * [`crate::Error::UnknownSession`] if `session_id` is not open; nothing is dispatched
    /// * [`crate::Error::InvalidMessage`] if `body` is not a JSON-RPC message
    /// * [`crate::Error::SessionBusy`] if the session already holds
    ///   `channelCapacity` unanswered messages
    #[tracing::instrument(skip(self, body), fields(session_id = %session_id))]
    pub async fn post_message(&self, session_id: &str, body: &[u8]) -> Result<()> {
        let channel = self.sessions.lookup(session_id).map_err(|e| {
            tracing::warn!("No transport found for sessionId");
            e
        })?;
        let message = JsonRpcMessage::from_slice(body)?;
        let permit = channel.admit(session_id).map_err(|e| {
            tracing::warn!("Session has too many unanswered messages");
            e
        })?;

        tracing::debug!(method = ?message.method(), "Accepted client message");

        let engine = channel.engine();
        tokio::spawn(
            async move {
                if let Err(e) = engine.handle(message).await {
                    tracing::debug!(error = %e, "Response discarded");
                }
                drop(permit);
            }
            .instrument(tracing::Span::current()),
        );

        Ok(())
    }

    /// Close every open session
    pub fn close_all_sessions(&self) {
        self.sessions.close_all();
    }
}
