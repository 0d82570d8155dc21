/// Error handling module for the SSE bridge.
///
/// This module defines the error types used throughout the library.
/// Errors fall into two groups: those surfaced to an HTTP caller before or
/// outside a session's stream (missing credential, backend construction,
/// unknown session, malformed message), and those reported to a session as
/// JSON-RPC errors over its stream (unknown tool, invalid arguments,
/// invocation failures).
///
/// # Example
///
/// ```
/// use mcp_sse_bridge::error::{Error, Result};
///
/// fn handle_error(result: Result<()>) {
///     match result {
///         Ok(_) => println!("Operation succeeded"),
///         Err(Error::UnknownSession(id)) => println!("Session '{}' is not open", id),
///         Err(Error::BackendConstruction(msg)) => println!("Backend failed: {}", msg),
///         Err(Error::Timeout(msg)) => println!("Operation timed out: {}", msg),
///         Err(e) => println!("Other error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur in the mcp-sse-bridge library.
///
/// Each variant includes context information to help diagnose and handle
/// the error appropriately. The HTTP status a variant maps to is defined in
/// [`crate::bridge::actix_error`].
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to parse configuration from a file or string.
    ///
    /// This error occurs when:
    /// - The configuration file cannot be read
    /// - The JSON or YAML is malformed
    /// - Field types are incorrect
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration parsed but contains values that fail validation checks.
    ///
    /// This error occurs when:
    /// - A route path does not start with `/`
    /// - A timeout, capacity or size limit is zero
    /// - Single-tenant mode is configured without a credential
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A streaming connection arrived without the credential the
    /// multi-tenant bridge requires.
    #[error("API key is required")]
    MissingCredential,

    /// The backend factory failed to construct an instance for a credential.
    ///
    /// This error occurs when:
    /// - The backend rejects the credential
    /// - A network error occurs during construction
    ///
    /// Nothing is cached when this happens; the next connection retries.
    #[error("Failed to initialize connection: {0}")]
    BackendConstruction(String),

    /// A posted message referenced a session id that is not registered.
    ///
    /// This error occurs when:
    /// - The session id was never issued
    /// - The session's stream has already closed
    #[error("No transport found for sessionId: {0}")]
    UnknownSession(String),

    /// A session already has as many unanswered messages as its stream can
    /// queue, usually because the client stopped reading the stream.
    #[error("Session is not accepting messages: {0}")]
    SessionBusy(String),

    /// A posted body could not be decoded as a JSON-RPC message.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Requested tool is not provided by the session's backend.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments failed the operation's own validation.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A tool invocation failed downstream.
    #[error("Invocation failed: {0}")]
    Invocation(String),

    /// Error in the JSON-RPC protocol.
    ///
    /// This error occurs when:
    /// - A request is missing required params
    /// - Params have the wrong shape for the method
    #[error("JSON-RPC error: {0}")]
    JsonRpc(String),

    /// Error in serializing or deserializing data.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error delivering a message on a session channel.
    ///
    /// This error occurs when:
    /// - The session's stream has been dropped while a result was in flight
    #[error("Communication error: {0}")]
    Communication(String),

    /// Operation timed out.
    ///
    /// This error occurs when:
    /// - Backend construction exceeds `backendInitTimeoutSecs`
    /// - A tool invocation exceeds `invocationTimeoutSecs`
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Error raised by a capability provider written against `anyhow`.
    #[error("Capability provider error: {0}")]
    Provider(#[from] anyhow::Error),

    /// Any other error not covered by the above categories.
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for mcp-sse-bridge operations.
///
/// This is a convenience type alias for `std::result::Result` with the `Error` type
/// from this module.
pub type Result<T> = std::result::Result<T, Error>;
