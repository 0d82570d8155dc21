/*!
 # MCP SSE Bridge

 A Rust library exposing credential-scoped MCP tool providers to remote
 clients over the Server-Sent Events (SSE) transport.

 ## Overview

 MCP SSE Bridge provides functionality to:
 - Accept long-lived SSE connections and track each as a session
 - Route client messages, posted separately over HTTP, to the right session
 - Build one backend per credential on demand and share it between sessions
 - Bind a dedicated protocol engine to every session so tenants never see
   each other's tools
 - Serve tool discovery (`tools/list`) and invocation (`tools/call`)

 ## Basic Usage

 ```no_run
 use async_trait::async_trait;
 use mcp_sse_bridge::{
     BridgeConfig, BridgeServer, Result,
     capability::{BackendHandle, CapabilityAdapter, Credential, OperationDescriptor},
     error::Error,
 };
 use serde_json::{Value, json};
 use std::sync::Arc;

 struct Echo;

 #[async_trait]
 impl CapabilityAdapter for Echo {
     fn list_operations(&self) -> Vec<OperationDescriptor> {
         vec![OperationDescriptor::new("echo", json!({"type": "object"}))]
     }

     async fn invoke(&self, _name: &str, arguments: Value) -> Result<Value> {
         Ok(arguments)
     }
 }

 #[tokio::main]
 async fn main() -> Result<()> {
     let config = BridgeConfig::default().apply_env()?;
     let factory = |_credential: Credential| async move {
         Ok::<BackendHandle, Error>(Arc::new(Echo))
     };

     let handle = BridgeServer::start(config, Arc::new(factory)).await?;
     tokio::signal::ctrl_c().await.ok();
     handle.shutdown().await
 }
 ```

 ## Features

 - **Session Multiplexing**: Many concurrent SSE sessions, each with its own engine
 - **Per-Credential Backends**: Lazily built, cached, constructed once per credential
 - **Single- and Multi-Tenant Modes**: Static credential or per-connection `apiKey`
 - **Configuration**: JSON or YAML files with environment overrides
 - **Error Handling**: Plain-text HTTP errors, JSON-RPC errors on the stream
 - **Async Support**: Built on Tokio and Actix Web

 ## License

 This project is licensed under the terms in the LICENSE file.
*/

pub mod backend;
pub mod bridge;
pub mod capability;
pub mod config;
pub mod error;
pub mod protocol;

pub use backend::InstanceCache;
pub use bridge::{Bridge, BridgeHandle, BridgeServer, SessionRegistry};
pub use capability::{BackendFactory, BackendHandle, CapabilityAdapter, Credential, OperationDescriptor};
pub use config::BridgeConfig;
pub use error::{Error, Result};
