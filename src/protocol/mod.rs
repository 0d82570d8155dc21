//! MCP protocol layer: JSON-RPC message types and the per-session engine.

pub mod engine;
pub mod json_rpc;

pub use engine::{ProtocolEngine, ServerIdentity};
pub use json_rpc::{JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
