//! Configuration module for the SSE bridge.
//!
//! This module handles parsing, validation, and access to the bridge's
//! settings. Configurations can be loaded from JSON or YAML files, parsed
//! from strings, or built programmatically from [`BridgeConfig::default`].
//!
//! # Examples
//!
//! Loading a configuration from a file:
//!
//! ```no_run
//! use mcp_sse_bridge::config::BridgeConfig;
//!
//! let config = BridgeConfig::from_file("bridge.yaml").unwrap();
//! println!("Bridge will listen on {}:{}", config.address, config.port);
//! ```
//!
//! Creating a single-tenant configuration programmatically:
//!
//! ```
//! use mcp_sse_bridge::config::{BridgeConfig, TenancyMode, validate_config};
//!
//! let config = BridgeConfig {
//!     port: 8080,
//!     tenancy: TenancyMode::Single {
//!         credential: "static-key".to_string(),
//!     },
//!     ..BridgeConfig::default()
//! };
//! assert!(validate_config(&config).is_ok());
//! ```
mod parser;
pub mod validator;

pub use parser::{
    BridgeConfig, DEFAULT_MAX_MESSAGE_BYTES, DEFAULT_PORT, DEFAULT_WORKERS, TenancyMode,
};
pub use validator::validate_config;
