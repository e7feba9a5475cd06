//! The MCP server: lifecycle and tool handlers over a transport.

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use crate::mcp::jsonrpc::JsonRpcHandler;
use crate::mcp::lifecycle::{register_lifecycle, ServerCapabilities, ServerInfo};
use crate::mcp::tools::{ToolDispatcher, ToolsHandler};
use crate::mcp::transport::{StdioTransport, TransportKind};
use crate::toolkit::ToolkitRegistry;
use crate::utils::error::McpResult;

/// An MCP server exposing the tools of one toolkit registry
#[derive(Debug)]
pub struct McpServer {
    handler: Arc<JsonRpcHandler>,
}

impl McpServer {
    /// Builds the server and registers its handlers.
    ///
    /// The toolkit is not built here; that happens on the first
    /// `tools/list` or `tools/call`.
    pub async fn new(registry: Arc<ToolkitRegistry>, server_info: ServerInfo) -> Self {
        let handler = Arc::new(JsonRpcHandler::new());
        let tools = ToolsHandler::new(Arc::new(ToolDispatcher::new(registry)));

        let capabilities = ServerCapabilities {
            tools: tools.capabilities().clone(),
        };
        register_lifecycle(&handler, server_info, capabilities).await;
        tools.register_methods(&handler).await;

        Self { handler }
    }

    /// Serves the given transport until its input ends
    pub async fn serve(&self, transport: TransportKind) -> McpResult<()> {
        match transport {
            TransportKind::Stdio => {
                info!("Starting MCP server on stdio");
                StdioTransport::stdio().run(&self.handler).await
            }
        }
    }

    /// Serves newline-delimited JSON-RPC over arbitrary streams
    pub async fn serve_streams<R, W>(&self, reader: R, writer: W) -> McpResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Starting MCP server");
        StdioTransport::new(reader, writer).run(&self.handler).await
    }
}
