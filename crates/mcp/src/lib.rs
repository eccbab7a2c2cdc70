//! MCP bridge to an out-of-process tool sidecar.
//!
//! Launches a sidecar executable, speaks JSON-RPC 2.0 with it over
//! newline-delimited stdio, and exposes its tools to a host as ordinary
//! [`Tool`](toolbridge_tool_runtime::Tool)s.
//!
//! # Architecture
//!
//! - **types**: JSON-RPC 2.0 and MCP-specific protocol types
//! - **transport**: line framing over the child's pipes
//! - **pending**: request id to waiting caller correlation
//! - **client**: process lifecycle, handshake and request dispatch
//! - **interpret**: raw tool results to [`ToolOutcome`](toolbridge_tool_runtime::ToolOutcome)
//! - **catalog**: static category and risk metadata for known tools
//! - **filter**: which discovered tools get registered
//! - **bridge**: enumerate, filter, register, execute
//! - **config**: TOML config with environment overrides
//! - **error**: Unified error types
//!
//! # Usage
//!
//! ```no_run
//! use toolbridge_mcp::{BridgeConfig, ToolBridge};
//! use toolbridge_tool_runtime::ToolRegistry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BridgeConfig::from_file("bridge.toml")?;
//! let mut registry = ToolRegistry::new();
//! let bridge = ToolBridge::start(&config, &mut registry).await?;
//! println!("{} tools available", bridge.registered());
//! bridge.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod interpret;
pub mod pending;
pub mod transport;
pub mod types;

pub use bridge::{bridge_tools, register_tools, BridgedTool, ToolBridge};
pub use catalog::{CapabilityMeta, RiskLevel, ToolCategory};
pub use client::McpClient;
pub use config::{BridgeConfig, ConfigError, SidecarConfig, HOST_MARKER_ENV};
pub use error::McpError;
pub use filter::{BridgeFilterConfig, FilterDecision, RejectReason};
pub use interpret::{format_error_message, guidance_for, interpret, outcome_for_error};
pub use types::*;
