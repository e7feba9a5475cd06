use crate::mcp::jsonrpc::JsonRpcHandler;
use crate::mcp::tools::models::{CallResponse, Tool};
use crate::mcp::tools::schema::ToolDescriptor;
use crate::utils::error::{McpError, McpResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Request parameters for listing tools
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListToolsParams {
    /// Optional cursor for pagination; every listing fits on one page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Response for listing tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResponse {
    /// List of available tools
    pub tools: Vec<Tool>,

    /// Optional cursor for fetching next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Request parameters for calling a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Name of the tool to call
    pub name: String,

    /// Arguments to pass to the tool; absent or `null` means none
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
}

/// The two operations the transport needs from the tool layer
#[async_trait]
pub trait ToolsProvider: Send + Sync {
    /// Descriptors of every exposed tool
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>>;

    /// Calls a tool by name
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> McpResult<CallResponse>;
}

/// Handler capabilities for tools
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapabilities {
    /// Whether the server notifies clients when the tool list changes
    #[serde(default)]
    pub list_changed: bool,
}

/// Binds a [`ToolsProvider`] to the `tools/list` and `tools/call` methods
pub struct ToolsHandler {
    /// Provider for tools functionality
    provider: Arc<dyn ToolsProvider>,

    /// Capabilities of the tools handler
    capabilities: ToolsCapabilities,
}

impl fmt::Debug for ToolsHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolsHandler")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl ToolsHandler {
    /// Creates a new tools handler with the given provider.
    ///
    /// The tool set never changes after startup, so `listChanged` is off.
    pub fn new(provider: Arc<dyn ToolsProvider>) -> Self {
        Self {
            provider,
            capabilities: ToolsCapabilities::default(),
        }
    }

    /// Returns the capabilities of this handler
    pub fn capabilities(&self) -> &ToolsCapabilities {
        &self.capabilities
    }

    /// Registers `tools/list` and `tools/call` with the JSON-RPC handler
    pub async fn register_methods(&self, method_handler: &JsonRpcHandler) {
        let list_provider = self.provider.clone();
        method_handler
            .register_method("tools/list", move |params| {
                let provider = list_provider.clone();
                async move {
                    // The cursor is accepted but ignored
                    let _params: ListToolsParams = match params {
                        Some(Value::Null) | None => ListToolsParams::default(),
                        Some(value) => serde_json::from_value(value)
                            .map_err(|e| McpError::InvalidParams(e.to_string()))?,
                    };

                    let tools = provider
                        .list_tools()
                        .await?
                        .iter()
                        .map(ToolDescriptor::to_tool)
                        .collect();

                    serde_json::to_value(ListToolsResponse {
                        tools,
                        next_cursor: None,
                    })
                    .map_err(|e| McpError::Serialization(e.to_string()))
                }
            })
            .await;

        let call_provider = self.provider.clone();
        method_handler
            .register_method("tools/call", move |params| {
                let provider = call_provider.clone();
                async move {
                    let params: CallToolParams =
                        serde_json::from_value(params.unwrap_or(Value::Null))
                            .map_err(|e| McpError::InvalidParams(e.to_string()))?;

                    let response = provider
                        .call_tool(&params.name, params.arguments.unwrap_or_default())
                        .await?;

                    serde_json::to_value(response)
                        .map_err(|e| McpError::Serialization(e.to_string()))
                }
            })
            .await;
    }
}

impl Clone for ToolsHandler {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            capabilities: self.capabilities.clone(),
        }
    }
}
