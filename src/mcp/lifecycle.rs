//! Session lifecycle handlers for the MCP protocol
//!
//! Answers the `initialize` handshake and `ping`, and accepts the
//! notifications clients send around them. The server is stateless between
//! requests, so no session state machine is kept.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::mcp::jsonrpc::JsonRpcHandler;
use crate::mcp::tools::ToolsCapabilities;
use crate::utils::error::McpError;

/// Protocol revision announced when the client does not name one
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Name and version reported in `initialize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "terminal-toolkit-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information sent with `initialize`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client name
    #[serde(default)]
    pub name: String,
    /// Client version
    #[serde(default)]
    pub version: String,
}

/// Initialize request parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol revision the client speaks
    #[serde(default)]
    pub protocol_version: Option<String>,
    /// Capabilities offered by the client; unused
    #[serde(default)]
    pub capabilities: Value,
    /// Client identification
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Capabilities announced by the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    /// Tool support
    pub tools: ToolsCapabilities,
}

/// Initialize response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Negotiated protocol revision
    pub protocol_version: String,
    /// Server capabilities
    pub capabilities: ServerCapabilities,
    /// Server identification
    pub server_info: ServerInfo,
}

/// Registers `initialize`, `ping` and the lifecycle notifications
pub async fn register_lifecycle(
    handler: &JsonRpcHandler,
    server_info: ServerInfo,
    capabilities: ServerCapabilities,
) {
    handler
        .register_method("initialize", move |params| {
            let server_info = server_info.clone();
            let capabilities = capabilities.clone();
            async move {
                let params: InitializeParams = match params {
                    Some(Value::Null) | None => InitializeParams::default(),
                    Some(value) => serde_json::from_value(value)
                        .map_err(|e| McpError::InvalidParams(e.to_string()))?,
                };

                if let Some(client) = &params.client_info {
                    info!(client = %client.name, version = %client.version, "Client connected");
                }

                let result = InitializeResult {
                    protocol_version: params
                        .protocol_version
                        .unwrap_or_else(|| DEFAULT_PROTOCOL_VERSION.to_string()),
                    capabilities,
                    server_info,
                };
                serde_json::to_value(result).map_err(|e| McpError::Serialization(e.to_string()))
            }
        })
        .await;

    handler
        .register_method("ping", |_| async { Ok(json!({})) })
        .await;

    handler
        .register_notification("notifications/initialized", |_| async {
            debug!("Client finished initialization");
            Ok(Value::Null)
        })
        .await;

    handler
        .register_notification("notifications/cancelled", |params| async move {
            debug!(?params, "Client cancelled a request");
            Ok(Value::Null)
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::types::JsonRpcRequest;

    #[tokio::test]
    async fn test_initialize_echoes_protocol_version() {
        let handler = JsonRpcHandler::new();
        register_lifecycle(&handler, ServerInfo::default(), ServerCapabilities::default()).await;

        let request = JsonRpcRequest::new(
            "initialize",
            Some(json!({
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "0.1"}
            })),
            json!(0),
        );
        let result = handler.handle_request(request).await.unwrap().result.unwrap();

        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], "terminal-toolkit-mcp");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn test_initialize_defaults() {
        let handler = JsonRpcHandler::new();
        register_lifecycle(&handler, ServerInfo::default(), ServerCapabilities::default()).await;

        let request = JsonRpcRequest::new("initialize", None, json!(0));
        let result = handler.handle_request(request).await.unwrap().result.unwrap();

        assert_eq!(result["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_ping() {
        let handler = JsonRpcHandler::new();
        register_lifecycle(&handler, ServerInfo::default(), ServerCapabilities::default()).await;

        let response = handler
            .handle_request(JsonRpcRequest::new("ping", None, json!("p")))
            .await
            .unwrap();
        assert_eq!(response.result, Some(json!({})));
    }
}
