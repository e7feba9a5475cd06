#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::bare_urls)]

//! A Model Context Protocol (MCP) server that exposes native callables as tools.
//!
//! Tools are plain Rust functions with a declared parameter list. The server
//! infers each tool's capability schema from that list and its doc string,
//! routes `tools/call` requests to it, and reports results and failures as
//! text. The bundled terminal toolkit provides shell execution tools.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use terminal_toolkit_mcp::config::ToolkitConfig;
//! use terminal_toolkit_mcp::mcp::lifecycle::ServerInfo;
//! use terminal_toolkit_mcp::mcp::server::McpServer;
//! use terminal_toolkit_mcp::mcp::transport::TransportKind;
//! use terminal_toolkit_mcp::toolkit::{TerminalToolkitFactory, ToolkitRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ToolkitConfig {
//!         timeout: 30.0,
//!         ..ToolkitConfig::default()
//!     };
//!     let registry = Arc::new(ToolkitRegistry::new(Arc::new(TerminalToolkitFactory), config));
//!
//!     let server = McpServer::new(registry, ServerInfo::default()).await;
//!     server.serve(TransportKind::Stdio).await?;
//!     Ok(())
//! }
//! ```

/// MCP protocol implementation: JSON-RPC, lifecycle, tools and transport.
pub mod mcp;

/// Toolkits and the registry that builds them.
pub mod toolkit;

/// Utility modules for error handling.
pub mod utils;

/// Configuration management
pub mod config;

/// Logging setup
pub mod telemetry;

pub use config::{ServerSettings, ToolkitConfig};
pub use mcp::server::McpServer;
pub use toolkit::{TerminalToolkitFactory, ToolkitRegistry};
pub use utils::error::{McpError, McpResult};

/// Re-export telemetry types and functions for easier access
pub use telemetry::{init_telemetry, TelemetryConfig};
