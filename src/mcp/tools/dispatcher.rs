use crate::mcp::tools::callable::{Arguments, Callable};
use crate::mcp::tools::handler::ToolsProvider;
use crate::mcp::tools::models::CallResponse;
use crate::mcp::tools::schema::{infer, ToolDescriptor};
use crate::toolkit::ToolkitRegistry;
use crate::utils::error::{McpError, McpResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Routes tool calls to the callables of the registry's toolkit.
///
/// Tool-level failures never escape: an unknown name, a binding error, an
/// error returned by the tool or a panic inside it all come back as a text
/// response. Only a failure to build the toolkit is returned as an error.
pub struct ToolDispatcher {
    registry: Arc<ToolkitRegistry>,
}

impl fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("registry", &self.registry)
            .finish()
    }
}

impl ToolDispatcher {
    /// Creates a dispatcher over `registry`
    pub fn new(registry: Arc<ToolkitRegistry>) -> Self {
        Self { registry }
    }

    /// Callables with duplicate names removed; the first one listed wins.
    ///
    /// The first call builds the toolkit on the blocking pool.
    async fn callables(&self) -> McpResult<Vec<Arc<dyn Callable>>> {
        let registry = self.registry.clone();
        let mut callables = if registry.is_initialized() {
            registry.list_callables()?
        } else {
            tokio::task::spawn_blocking(move || registry.list_callables())
                .await
                .map_err(|e| McpError::ToolkitInit(format!("toolkit factory failed: {}", e)))??
        };

        let mut seen = HashSet::new();
        callables.retain(|callable| {
            let fresh = seen.insert(callable.name().to_string());
            if !fresh {
                warn!("Duplicate tool name '{}' ignored", callable.name());
            }
            fresh
        });
        Ok(callables)
    }

    /// Resolves `name` and invokes it with `arguments`
    pub async fn dispatch(&self, name: &str, arguments: Map<String, Value>) -> McpResult<CallResponse> {
        let Some(callable) = self
            .callables()
            .await?
            .into_iter()
            .find(|callable| callable.name() == name)
        else {
            info!("Tool '{}' not found", name);
            return Ok(CallResponse::text(format!("Tool '{}' not found", name)));
        };

        debug!("Calling tool {}", name);
        let response = match invoke(callable, arguments).await {
            Ok(Value::String(text)) => CallResponse::text(text),
            Ok(other) => CallResponse::text(other.to_string()),
            Err(message) => {
                error!("Error calling tool {}: {}", name, message);
                CallResponse::text(format!("Error calling tool {}: {}", name, message))
            }
        };
        Ok(response)
    }
}

/// Binds and runs the callable on the blocking pool, flattening every
/// failure into its message.
async fn invoke(callable: Arc<dyn Callable>, arguments: Map<String, Value>) -> Result<Value, String> {
    let task = tokio::task::spawn_blocking(move || {
        let args = Arguments::bind(callable.params(), arguments)?;
        callable.call(args)
    });

    match task.await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(join_error) if join_error.is_panic() => {
            let payload = join_error.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "tool panicked".to_string());
            Err(message)
        }
        Err(join_error) => Err(join_error.to_string()),
    }
}

#[async_trait]
impl ToolsProvider for ToolDispatcher {
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        Ok(self
            .callables()
            .await?
            .iter()
            .map(|callable| infer(callable.as_ref()))
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> McpResult<CallResponse> {
        self.dispatch(name, arguments).await
    }
}
