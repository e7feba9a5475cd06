//! # JSON-RPC Types
//!
//! Wire types for the JSON-RPC 2.0 envelope that carries every MCP message:
//!
//! - `JsonRpcRequest`: a method invocation that expects a response
//! - `JsonRpcResponse`: the result (or error) of a request
//! - `JsonRpcNotification`: a one-way message without an `id`
//! - `JsonRpcError`: the standard error object
//!
//! ## Example
//!
//! ```rust
//! use terminal_toolkit_mcp::mcp::types::{JsonRpcRequest, JsonRpcResponse};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::new("tools/list", None, json!(1));
//! let response = JsonRpcResponse::success(json!({ "tools": [] }), request.id.clone());
//!
//! assert_eq!(response.id, json!(1));
//! assert!(response.error.is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::utils::error::{McpError, McpResult};

/// Version string carried by every JSON-RPC 2.0 message
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request object for MCP protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version, always "2.0"
    pub jsonrpc: String,
    /// Method name to invoke
    pub method: String,
    /// Parameters for the method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Unique identifier for the request
    pub id: serde_json::Value,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request
    pub fn new(method: &str, params: Option<serde_json::Value>, id: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response object for MCP protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version, always "2.0"
    pub jsonrpc: String,
    /// Result of the method call, must be present if no error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error information, must be present if no result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier that this response corresponds to
    pub id: serde_json::Value,
}

impl JsonRpcResponse {
    /// Create a new successful JSON-RPC response
    pub fn success(result: serde_json::Value, id: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create a new error JSON-RPC response
    pub fn error(error: JsonRpcError, id: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Serialize the response to JSON bytes
    pub fn to_bytes(&self) -> McpResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| McpError::Serialization(format!("Failed to serialize response: {}", e)))
    }
}

/// JSON-RPC 2.0 notification object for MCP protocol (has no ID)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version, always "2.0"
    pub jsonrpc: String,
    /// Method name to invoke
    pub method: String,
    /// Parameters for the method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 error object for MCP protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Create a new JSON-RPC error
    pub fn new(code: i32, message: &str, data: Option<serde_json::Value>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data,
        }
    }

    /// Parse error (-32700)
    pub fn parse_error(message: &str) -> Self {
        Self::new(-32700, message, None)
    }

    /// Invalid request error (-32600)
    pub fn invalid_request(message: &str) -> Self {
        Self::new(-32600, message, None)
    }

    /// Method not found error (-32601)
    pub fn method_not_found(message: &str) -> Self {
        Self::new(-32601, message, None)
    }

    /// Invalid params error (-32602)
    pub fn invalid_params(message: &str) -> Self {
        Self::new(-32602, message, None)
    }

    /// Internal error (-32603)
    pub fn internal_error(message: &str) -> Self {
        Self::new(-32603, message, None)
    }
}

impl From<&McpError> for JsonRpcError {
    fn from(error: &McpError) -> Self {
        match error {
            McpError::InvalidParams(msg) => JsonRpcError::invalid_params(msg),
            other => JsonRpcError::internal_error(&other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_without_id_is_rejected() {
        let raw = br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(serde_json::from_slice::<JsonRpcRequest>(raw).is_err());
        assert!(serde_json::from_slice::<JsonRpcNotification>(raw).is_ok());
    }

    #[test]
    fn test_error_response_omits_result() {
        let response = JsonRpcResponse::error(JsonRpcError::method_not_found("nope"), json!(7));
        let value: serde_json::Value =
            serde_json::from_slice(&response.to_bytes().unwrap()).unwrap();

        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32601);
        assert_eq!(value["id"], 7);
    }

    #[test]
    fn test_error_code_mapping() {
        let err = JsonRpcError::from(&McpError::InvalidParams("missing name".into()));
        assert_eq!(err.code, -32602);

        let err = JsonRpcError::from(&McpError::Serialization("boom".into()));
        assert_eq!(err.code, -32603);
    }
}
