//! Capability provider surface consumed by the bridge.
//!
//! A capability provider is the external system that actually implements the
//! tools. The bridge only needs two views of it:
//! - [`CapabilityAdapter`]: the operation catalog plus one dispatch entry point
//! - [`BackendFactory`]: how to build an adapter for a given [`Credential`]
//!
//! Any async closure `Fn(Credential) -> Future<Output = Result<BackendHandle>>`
//! is a [`BackendFactory`].
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use mcp_sse_bridge::capability::{
//!     BackendHandle, CapabilityAdapter, Credential, OperationDescriptor,
//! };
//! use mcp_sse_bridge::error::{Error, Result};
//! use serde_json::{Value, json};
//! use std::sync::Arc;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl CapabilityAdapter for Echo {
//!     fn list_operations(&self) -> Vec<OperationDescriptor> {
//!         vec![OperationDescriptor::new("echo", json!({"type": "object"}))]
//!     }
//!
//!     async fn invoke(&self, name: &str, arguments: Value) -> Result<Value> {
//!         match name {
//!             "echo" => Ok(arguments),
//!             other => Err(Error::ToolNotFound(other.to_string())),
//!         }
//!     }
//! }
//!
//! let factory = |_credential: Credential| async move {
//!     Ok::<BackendHandle, Error>(Arc::new(Echo))
//! };
//! # let _ = factory;
//! ```

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A credential-scoped backend, shared by every session using that credential.
pub type BackendHandle = Arc<dyn CapabilityAdapter>;

/// An opaque per-connection credential.
///
/// Only used as a cache key and handed to the [`BackendFactory`]. `Debug`
/// and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw credential value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for handing to the backend
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Describes one invocable operation.
///
/// Serialised in the MCP tool shape (`name`, `description`, `inputSchema`).
/// Fields this struct does not model are kept in `extra` so discovery hands
/// the provider's descriptor to clients unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Name used when invoking the operation.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the operation's arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    /// Any additional provider-defined fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OperationDescriptor {
    /// Create a descriptor with no description or extra fields
    pub fn new(name: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema,
            extra: Map::new(),
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The operations a backend exposes and the entry point that runs them.
#[async_trait]
pub trait CapabilityAdapter: Send + Sync {
    /// The operation catalog. Must be pure and cheap; it is called for every
    /// discovery request.
    fn list_operations(&self) -> Vec<OperationDescriptor>;

    /// Run the operation `name` with `arguments`.
    ///
    /// Fails with [`crate::Error::ToolNotFound`] for an unknown name,
    /// [`crate::Error::InvalidArguments`] when the operation rejects its
    /// input, or any other error for downstream failures.
    async fn invoke(&self, name: &str, arguments: Value) -> Result<Value>;
}

/// Builds a backend for a credential. May perform network I/O and fail.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    /// Construct the backend for `credential`.
    async fn create(&self, credential: &Credential) -> Result<BackendHandle>;
}

#[async_trait]
impl<F, Fut> BackendFactory for F
where
    F: Fn(Credential) -> Fut + Send + Sync,
    Fut: Future<Output = Result<BackendHandle>> + Send + 'static,
{
    async fn create(&self, credential: &Credential) -> Result<BackendHandle> {
        (self)(credential.clone()).await
    }
}
