//! Toolkits: collections of callables built from a [`ToolkitConfig`].
//!
//! The server never constructs tools itself. It asks a [`ToolkitFactory`]
//! for a [`Toolkit`] the first time a tool is listed or called, through the
//! [`ToolkitRegistry`], and exposes whatever callables the toolkit returns.

pub mod registry;
pub mod session;
pub mod terminal;

pub use registry::ToolkitRegistry;
pub use terminal::{TerminalToolkit, TerminalToolkitFactory};

use std::sync::Arc;

use crate::config::ToolkitConfig;
use crate::mcp::tools::Callable;
use crate::utils::error::McpResult;

/// A built set of tools
pub trait Toolkit: Send + Sync {
    /// The callables exposed by this toolkit, in listing order
    fn callables(&self) -> Vec<Arc<dyn Callable>>;
}

/// Builds a toolkit from configuration
pub trait ToolkitFactory: Send + Sync {
    /// Constructs the toolkit.
    ///
    /// # Errors
    ///
    /// Any error is treated as fatal by the server.
    fn build(&self, config: &ToolkitConfig) -> McpResult<Arc<dyn Toolkit>>;
}

impl<F> ToolkitFactory for F
where
    F: Fn(&ToolkitConfig) -> McpResult<Arc<dyn Toolkit>> + Send + Sync,
{
    fn build(&self, config: &ToolkitConfig) -> McpResult<Arc<dyn Toolkit>> {
        (self)(config)
    }
}

/// A toolkit over a fixed list of callables
#[derive(Clone, Default)]
pub struct StaticToolkit {
    callables: Vec<Arc<dyn Callable>>,
}

impl std::fmt::Debug for StaticToolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.callables.iter().map(|c| c.name().to_string()).collect();
        f.debug_struct("StaticToolkit")
            .field("callables", &names)
            .finish()
    }
}

impl StaticToolkit {
    /// Creates a toolkit exposing `callables`
    pub fn new(callables: Vec<Arc<dyn Callable>>) -> Self {
        Self { callables }
    }
}

impl Toolkit for StaticToolkit {
    fn callables(&self) -> Vec<Arc<dyn Callable>> {
        self.callables.clone()
    }
}
