//! Newline-delimited JSON-RPC over a pair of byte streams.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tracing::{debug, info};

use crate::mcp::jsonrpc::JsonRpcHandler;
use crate::utils::error::{McpError, McpResult};

/// Serves one JSON-RPC message per line.
///
/// Each message is processed to completion before the next line is read,
/// so requests are answered strictly in order.
pub struct StdioTransport<R, W> {
    lines: Lines<BufReader<R>>,
    writer: W,
}

impl<R, W> std::fmt::Debug for StdioTransport<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioTransport").finish_non_exhaustive()
    }
}

impl StdioTransport<tokio::io::Stdin, tokio::io::Stdout> {
    /// Transport bound to the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a transport over arbitrary streams
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    /// Reads messages until end of input, writing a response line for every
    /// request.
    ///
    /// # Errors
    ///
    /// Stream failures and fatal handler errors end the loop and are
    /// returned; everything else is answered on the wire.
    pub async fn run(&mut self, handler: &JsonRpcHandler) -> McpResult<()> {
        info!("Serving MCP over stdio");

        while let Some(line) = self
            .lines
            .next_line()
            .await
            .map_err(|e| McpError::Transport(format!("Failed to read message: {}", e)))?
        {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            debug!("Received {} bytes", line.len());

            if let Some(response) = handler.process_json_message(line.as_bytes()).await? {
                self.write_line(&response).await?;
            }
        }

        info!("Input closed, stopping stdio transport");
        Ok(())
    }

    async fn write_line(&mut self, bytes: &[u8]) -> McpResult<()> {
        let io = async {
            self.writer.write_all(bytes).await?;
            self.writer.write_all(b"\n").await?;
            self.writer.flush().await
        };
        io.await
            .map_err(|e| McpError::Transport(format!("Failed to write response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_one_response_per_request() {
        let handler = JsonRpcHandler::new();
        handler
            .register_method("ping", |_| async { Ok(json!({})) })
            .await;

        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n",
        );
        let mut output = Vec::new();
        StdioTransport::new(input.as_bytes(), &mut output)
            .run(&handler)
            .await
            .unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
    }

    #[tokio::test]
    async fn test_fatal_handler_error_stops_loop() {
        let handler = JsonRpcHandler::new();
        handler
            .register_method("tools/list", |_| async {
                Err(McpError::ToolkitInit("bad config".into()))
            })
            .await;

        let input = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n";
        let mut output = Vec::new();
        let result = StdioTransport::new(input.as_bytes(), &mut output)
            .run(&handler)
            .await;

        assert!(matches!(result, Err(McpError::ToolkitInit(_))));
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_transport_error() {
        let handler = JsonRpcHandler::new();

        let reader = tokio_test::io::Builder::new()
            .read(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
            .build();
        let writer = tokio_test::io::Builder::new()
            .write_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            .build();

        let result = StdioTransport::new(reader, writer).run(&handler).await;

        assert!(matches!(result, Err(McpError::Transport(msg)) if msg.contains("closed")));
    }
}
