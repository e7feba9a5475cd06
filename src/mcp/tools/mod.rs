//! # MCP Tools System
//!
//! Exposes plain native callables as MCP tools.
//!
//! ## Features
//!
//! - Capability schemas inferred from declared parameter lists and doc strings
//! - Argument binding with defaults and basic type coercion
//! - Dispatch by name with every tool failure reported as text
//!
//! ## Usage
//!
//! ```rust,no_run
//! use terminal_toolkit_mcp::config::ToolkitConfig;
//! use terminal_toolkit_mcp::mcp::tools::{infer, FnTool, ParamSpec, ToolDispatcher, ToolsHandler};
//! use terminal_toolkit_mcp::toolkit::{StaticToolkit, Toolkit, ToolkitRegistry};
//! use terminal_toolkit_mcp::utils::error::McpResult;
//! use serde_json::Value;
//! use std::sync::Arc;
//!
//! let echo = FnTool::new("echo", vec![ParamSpec::new("x").typed("str")], |args| {
//!     Ok(Value::String(args.str("x")?.to_string()))
//! })
//! .with_doc("Echoes its input.");
//!
//! assert_eq!(infer(&echo).required, vec!["x"]);
//!
//! let factory = move |_: &ToolkitConfig| -> McpResult<Arc<dyn Toolkit>> {
//!     Ok(Arc::new(StaticToolkit::new(vec![echo.clone().into_callable()])))
//! };
//! let registry = Arc::new(ToolkitRegistry::new(Arc::new(factory), ToolkitConfig::default()));
//! let handler = ToolsHandler::new(Arc::new(ToolDispatcher::new(registry)));
//! ```

mod callable;
mod dispatcher;
mod error;
mod handler;
mod models;
mod schema;

// Re-export the public API
pub use callable::{Arguments, Callable, FnTool};
pub use dispatcher::ToolDispatcher;
pub use error::{ToolError, ToolResult};
pub use handler::{
    CallToolParams, ListToolsParams, ListToolsResponse, ToolsCapabilities, ToolsHandler,
    ToolsProvider,
};
pub use models::{CallResponse, Tool, ToolResultContent};
pub use schema::{infer, ParamKind, ParamSpec, ParameterSchema, ToolDescriptor};
