use async_trait::async_trait;
use mcp_sse_bridge::capability::{BackendHandle, CapabilityAdapter, Credential, OperationDescriptor};
use mcp_sse_bridge::config::TenancyMode;
use mcp_sse_bridge::{BridgeConfig, BridgeServer, Error, Result};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

/// A toy capability provider with two tools
struct Calculator;

#[async_trait]
impl CapabilityAdapter for Calculator {
    fn list_operations(&self) -> Vec<OperationDescriptor> {
        vec![
            OperationDescriptor::new(
                "echo",
                json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            )
            .with_description("Return the given text"),
            OperationDescriptor::new(
                "add",
                json!({
                    "type": "object",
                    "properties": {
                        "a": { "type": "number" },
                        "b": { "type": "number" }
                    },
                    "required": ["a", "b"]
                }),
            )
            .with_description("Add two numbers"),
        ]
    }

    async fn invoke(&self, name: &str, arguments: Value) -> Result<Value> {
        match name {
            "echo" => {
                let text = arguments
                    .get("text")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::InvalidArguments("'text' must be a string".to_string()))?;
                Ok(json!({ "content": [{ "type": "text", "text": text }] }))
            }
            "add" => {
                let a = arguments.get("a").and_then(Value::as_f64);
                let b = arguments.get("b").and_then(Value::as_f64);
                match (a, b) {
                    (Some(a), Some(b)) => {
                        Ok(json!({ "content": [{ "type": "text", "text": (a + b).to_string() }] }))
                    }
                    _ => Err(Error::InvalidArguments("'a' and 'b' must be numbers".to_string())),
                }
            }
            other => Err(Error::ToolNotFound(other.to_string())),
        }
    }
}

async fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::default(),
    }
    .apply_env()?;

    match &config.tenancy {
        TenancyMode::Multi => info!("Multi-tenant mode: clients must pass ?apiKey=..."),
        TenancyMode::Single { .. } => info!("Single-tenant mode: static credential from environment"),
    }

    // Credentials starting with "bad" are rejected to show a failed construction.
    let factory = |credential: Credential| async move {
        if credential.expose().starts_with("bad") {
            return Err(Error::BackendConstruction("credential rejected".to_string()));
        }
        Ok::<BackendHandle, Error>(Arc::new(Calculator))
    };

    let handle = BridgeServer::start(config.clone(), Arc::new(factory)).await?;

    let host = &config.address;
    let port = &config.port;
    info!("Available HTTP endpoints:");
    info!(" - Open a session:   GET  http://{}:{}{}?apiKey=KEY", host, port, config.sse_path);
    info!(" - Post a message:   POST http://{}:{}{}?sessionId=ID", host, port, config.messages_path);
    info!("");
    info!("Example SSE client with curl:");
    info!("curl -N 'http://{}:{}{}?apiKey=demo'", host, port, config.sse_path);
    info!("");
    info!("Press Ctrl+C to exit");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to wait for Ctrl+C");
    }

    info!("Shutting down");
    handle.shutdown().await
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .init();

    info!("Starting echo bridge demo");

    if let Err(e) = run().await {
        error!(error = %e, "Fatal error in bridge demo");
        std::process::exit(1);
    }
}
