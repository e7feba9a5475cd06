//! JSON-RPC implementation for MCP protocol, compliant with JSON-RPC 2.0 specification.
//!
//! This module routes JSON-RPC messages to registered handlers. It handles:
//!
//! - Method registration and invocation
//! - Notification processing
//! - Error handling and reporting
//! - Raw message processing
//!
//! Handlers are asynchronous. Errors returned by a handler are turned into
//! JSON-RPC error responses, except for fatal infrastructure errors (see
//! [`McpError::is_fatal`]) which are handed back to the caller so the
//! transport can shut down.
//!
//! # Example
//!
//! ```rust,no_run
//! use terminal_toolkit_mcp::mcp::jsonrpc::JsonRpcHandler;
//! use terminal_toolkit_mcp::mcp::types::JsonRpcRequest;
//!
//! async fn example() {
//!     let handler = JsonRpcHandler::new();
//!
//!     handler.register_method("echo", |params| async move {
//!         Ok(params.unwrap_or(serde_json::Value::Null))
//!     }).await;
//!
//!     let request = JsonRpcRequest::new(
//!         "echo",
//!         Some(serde_json::json!("Hello, world!")),
//!         serde_json::Value::String("1".to_string()),
//!     );
//!
//!     let response = handler.handle_request(request).await.unwrap();
//!     println!("Result: {:?}", response.result);
//! }
//! ```

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::mcp::types::{
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION,
};
use crate::utils::error::{McpError, McpResult};

/// Handler for JSON-RPC method calls
///
/// Takes the optional `params` value of the message and resolves to the
/// `result` value of the response.
pub type MethodHandler =
    Arc<dyn Fn(Option<Value>) -> BoxFuture<'static, McpResult<Value>> + Send + Sync>;

/// JSON-RPC handler for MCP protocol
///
/// Method registrations are stored for the lifetime of the handler.
/// Notification handlers are kept separately from methods since they never
/// produce a response.
pub struct JsonRpcHandler {
    /// Registered method handlers mapped by method name
    methods: RwLock<HashMap<String, MethodHandler>>,
    /// Notification handlers mapped by notification name
    notification_handlers: RwLock<HashMap<String, MethodHandler>>,
}

impl std::fmt::Debug for JsonRpcHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcHandler")
            .field(
                "methods_count",
                &self.methods.try_read().map(|m| m.len()).unwrap_or(0),
            )
            .field(
                "notification_handlers_count",
                &self
                    .notification_handlers
                    .try_read()
                    .map(|h| h.len())
                    .unwrap_or(0),
            )
            .finish()
    }
}

impl JsonRpcHandler {
    /// Creates a new JSON-RPC handler with empty registrations
    pub fn new() -> Self {
        debug!("Creating new JSON-RPC handler");
        Self {
            methods: RwLock::new(HashMap::new()),
            notification_handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a method handler for a specified method name
    ///
    /// A later registration under the same name replaces the earlier one.
    #[instrument(skip(self, handler), fields(method = %name))]
    pub async fn register_method<F, Fut>(&self, name: &str, handler: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<Value>> + Send + 'static,
    {
        let handler: MethodHandler = Arc::new(move |params| handler(params).boxed());
        self.methods.write().await.insert(name.to_string(), handler);
        debug!("Registered method handler for '{}'", name);
    }

    /// Registers a notification handler for a specified notification type
    #[instrument(skip(self, handler), fields(method = %name))]
    pub async fn register_notification<F, Fut>(&self, name: &str, handler: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<Value>> + Send + 'static,
    {
        let handler: MethodHandler = Arc::new(move |params| handler(params).boxed());
        self.notification_handlers
            .write()
            .await
            .insert(name.to_string(), handler);
        debug!("Registered notification handler for '{}'", name);
    }

    /// Handles a JSON-RPC request and produces a response
    ///
    /// # Error Handling
    ///
    /// Invalid versions, unknown methods and handler errors all produce a
    /// JSON-RPC error response. Only fatal errors are returned as `Err`.
    #[instrument(skip(self, request), fields(method = %request.method, id = ?request.id))]
    pub async fn handle_request(&self, request: JsonRpcRequest) -> McpResult<JsonRpcResponse> {
        debug!("Handling JSON-RPC request");

        if request.jsonrpc != JSONRPC_VERSION {
            warn!("Invalid JSON-RPC version: {}", request.jsonrpc);
            return Ok(JsonRpcResponse::error(
                JsonRpcError::invalid_request("Invalid JSON-RPC version"),
                request.id,
            ));
        }

        // Clone the handler out so the lock is not held while it runs
        let handler = self.methods.read().await.get(&request.method).cloned();

        let Some(handler) = handler else {
            warn!("Method not found: {}", request.method);
            return Ok(JsonRpcResponse::error(
                JsonRpcError::method_not_found(&format!("Method '{}' not found", request.method)),
                request.id,
            ));
        };

        match handler(request.params).await {
            Ok(result) => {
                debug!("Method call successful: {}", request.method);
                Ok(JsonRpcResponse::success(result, request.id))
            }
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                warn!("Method call failed: {}: {}", request.method, error);
                Ok(JsonRpcResponse::error(JsonRpcError::from(&error), request.id))
            }
        }
    }

    /// Handles a JSON-RPC notification
    ///
    /// Unknown notifications are silently ignored per the JSON-RPC 2.0
    /// specification. Non-fatal handler errors are logged and dropped since
    /// there is no one to report them to.
    #[instrument(skip(self, notification), fields(method = %notification.method))]
    pub async fn handle_notification(&self, notification: JsonRpcNotification) -> McpResult<()> {
        debug!("Handling JSON-RPC notification");

        if notification.jsonrpc != JSONRPC_VERSION {
            warn!(
                "Invalid JSON-RPC version in notification: {}",
                notification.jsonrpc
            );
            return Ok(());
        }

        let handler = self
            .notification_handlers
            .read()
            .await
            .get(&notification.method)
            .cloned();

        match handler {
            Some(handler) => match handler(notification.params).await {
                Ok(_) => Ok(()),
                Err(error) if error.is_fatal() => Err(error),
                Err(error) => {
                    warn!(
                        "Notification processing failed: {}: {}",
                        notification.method, error
                    );
                    Ok(())
                }
            },
            None => {
                debug!("No handler for notification method: {}", notification.method);
                Ok(())
            }
        }
    }

    /// Processes a raw JSON message and determines if it's a request or notification
    ///
    /// Returns `Some(bytes)` holding the serialized response when the message
    /// warrants one, and `None` for notifications. Malformed input is answered
    /// with a parse error or invalid request response carrying a `null` id.
    #[instrument(skip(self, json_data))]
    pub async fn process_json_message(&self, json_data: &[u8]) -> McpResult<Option<Vec<u8>>> {
        let value: Value = match serde_json::from_slice(json_data) {
            Ok(value) => value,
            Err(e) => {
                warn!("Invalid JSON received: {}", e);
                let response = JsonRpcResponse::error(
                    JsonRpcError::parse_error(&format!("Parse error: {}", e)),
                    Value::Null,
                );
                return response.to_bytes().map(Some);
            }
        };

        let Some(object) = value.as_object() else {
            warn!("JSON-RPC message is not an object");
            let response = JsonRpcResponse::error(
                JsonRpcError::invalid_request("Expected a JSON-RPC object"),
                Value::Null,
            );
            return response.to_bytes().map(Some);
        };

        if let Some(id) = object.get("id").cloned() {
            let response = match serde_json::from_value::<JsonRpcRequest>(value) {
                Ok(request) => self.handle_request(request).await?,
                Err(e) => {
                    warn!("Invalid JSON-RPC request: {}", e);
                    JsonRpcResponse::error(
                        JsonRpcError::invalid_request(&format!("Invalid request: {}", e)),
                        id,
                    )
                }
            };
            return response.to_bytes().map(Some);
        }

        match serde_json::from_value::<JsonRpcNotification>(value) {
            Ok(notification) => {
                self.handle_notification(notification).await?;
                Ok(None)
            }
            Err(e) => {
                warn!("Invalid JSON-RPC notification: {}", e);
                Ok(None)
            }
        }
    }
}

impl Default for JsonRpcHandler {
    fn default() -> Self {
        Self::new()
    }
}
