use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default number of Actix Web workers.
pub const DEFAULT_WORKERS: usize = 4;
/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default cap on a posted message body (4 MiB).
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

/// Environment variable overriding the listening port.
const PORT_ENV: &str = "PORT";
/// Environment variable switching the bridge to single-tenant mode.
const API_KEY_ENV: &str = "BRIDGE_API_KEY";

/// How the bridge obtains the credential for a new streaming connection.
///
/// # JSON
///
/// ```json
/// { "mode": "multi" }
/// { "mode": "single", "credential": "my-static-key" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TenancyMode {
    /// Every connection carries its own credential in the `apiKey` query
    /// parameter. Backends are cached per credential.
    #[default]
    Multi,
    /// One static credential, read once at startup, serves every connection.
    Single {
        /// The credential passed to the backend factory.
        credential: String,
    },
}

/// Main configuration for the SSE bridge.
///
/// Every field has a default, so an empty document is a valid configuration.
///
/// # JSON Schema
///
/// ```json
/// {
///   "address": "0.0.0.0",
///   "port": 3000,
///   "workers": 4,
///   "ssePath": "/sse",
///   "messagesPath": "/messages",
///   "tenancy": { "mode": "multi" },
///   "serverName": "mcp-sse-bridge",
///   "backendInitTimeoutSecs": 30,
///   "invocationTimeoutSecs": 60,
///   "channelCapacity": 100,
///   "keepAliveSecs": 15,
///   "maxMessageBytes": 4194304
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Address to bind the HTTP server to.
    pub address: String,
    /// Port to listen on.
    pub port: u16,
    /// Number of Actix Web workers; [`DEFAULT_WORKERS`] when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Route that opens a streaming connection.
    pub sse_path: String,
    /// Route clients post their JSON-RPC messages to.
    pub messages_path: String,
    /// Credential resolution policy.
    pub tenancy: TenancyMode,
    /// Name reported in `serverInfo` during `initialize`.
    pub server_name: String,
    /// Version reported in `serverInfo` during `initialize`.
    pub server_version: String,
    /// Upper bound on backend construction.
    pub backend_init_timeout_secs: u64,
    /// Upper bound on a single tool invocation.
    pub invocation_timeout_secs: u64,
    /// Depth of each session's outbound queue.
    pub channel_capacity: usize,
    /// Interval between SSE keep-alive comments.
    pub keep_alive_secs: u64,
    /// Largest accepted POST body.
    pub max_message_bytes: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            workers: None,
            sse_path: "/sse".to_string(),
            messages_path: "/messages".to_string(),
            tenancy: TenancyMode::Multi,
            server_name: env!("CARGO_PKG_NAME").to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            backend_init_timeout_secs: 30,
            invocation_timeout_secs: 60,
            channel_capacity: 100,
            keep_alive_secs: 15,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

impl BridgeConfig {
    /// Loads a configuration from a file path.
    ///
    /// Files ending in `.yaml` or `.yml` are parsed as YAML, everything else
    /// as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be read
    /// * The file contents are not valid JSON/YAML
    /// * The document does not conform to the expected schema
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read config file: {}", e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_from_yaml_str(&content),
            _ => Self::parse_from_str(&content),
        }
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid JSON or does not conform
    /// to the expected schema.
    pub fn parse_from_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))
    }

    /// Parses a configuration from a YAML string.
    pub fn parse_from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse YAML config: {}", e)))
    }

    /// Applies `PORT` and `BRIDGE_API_KEY` from the process environment.
    ///
    /// A set `BRIDGE_API_KEY` switches the bridge to single-tenant mode.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(
            std::env::var(PORT_ENV).ok(),
            std::env::var(API_KEY_ENV).ok(),
        )
    }

    /// Applies explicit overrides; the testable half of [`Self::apply_env`].
    pub fn apply_overrides(mut self, port: Option<String>, api_key: Option<String>) -> Result<Self> {
        if let Some(port) = port {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| Error::ConfigInvalid(format!("Invalid {} '{}': {}", PORT_ENV, port, e)))?;
        }

        if let Some(credential) = api_key {
            tracing::debug!("Static credential found in environment, using single-tenant mode");
            self.tenancy = TenancyMode::Single { credential };
        }

        Ok(self)
    }

    /// Number of Actix Web workers to start.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_WORKERS)
    }

    /// Backend construction bound.
    pub fn backend_init_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_init_timeout_secs)
    }

    /// Tool invocation bound.
    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_secs(self.invocation_timeout_secs)
    }

    /// Keep-alive period for open streams.
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}
