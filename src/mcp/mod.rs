//! Core MCP protocol implementation: JSON-RPC routing, lifecycle, tools and transport.
//!
//! # Model Context Protocol (MCP)
//!
//! MCP lets a model-facing client discover and call tools hosted by a server.
//! This module implements the server side for the tools primitive:
//!
//! - **JSON-RPC routing**: method and notification dispatch per JSON-RPC 2.0
//! - **Lifecycle**: the `initialize` handshake and `ping`
//! - **Tools**: `tools/list` and `tools/call` backed by native callables
//! - **Transport**: newline-delimited messages over stdio
//!
//! ## Architecture
//!
//! - `types`: JSON-RPC wire types
//! - `jsonrpc`: method registration and message processing
//! - `lifecycle`: session initialization handlers
//! - `tools`: schema inference, argument binding and dispatch
//! - `transport`: the stdio transport
//! - `server`: wires the above to a toolkit registry
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use terminal_toolkit_mcp::config::ToolkitConfig;
//! use terminal_toolkit_mcp::mcp::lifecycle::ServerInfo;
//! use terminal_toolkit_mcp::mcp::server::McpServer;
//! use terminal_toolkit_mcp::mcp::transport::TransportKind;
//! use terminal_toolkit_mcp::toolkit::{TerminalToolkitFactory, ToolkitRegistry};
//!
//! async fn example() {
//!     let registry = Arc::new(ToolkitRegistry::new(
//!         Arc::new(TerminalToolkitFactory),
//!         ToolkitConfig::default(),
//!     ));
//!     let server = McpServer::new(registry, ServerInfo::default()).await;
//!     server.serve(TransportKind::Stdio).await.expect("server failed");
//! }
//! ```

/// JSON-RPC wire types
pub mod types;

/// JSON-RPC implementation for the MCP protocol
pub mod jsonrpc;

/// Session lifecycle handlers
pub mod lifecycle;

/// Tool system for model actions
pub mod tools;

/// Transport layer implementations
pub mod transport;

/// Server assembly
pub mod server;
