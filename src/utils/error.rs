use thiserror::Error;

/// A specialized Result type for MCP operations.
pub type McpResult<T> = Result<T, McpError>;

/// Represents errors that can occur while serving the MCP protocol.
///
/// Errors raised *inside* a tool never show up here: the dispatcher turns
/// them into ordinary text responses. What remains are protocol problems,
/// which are answered with JSON-RPC error objects, and infrastructure
/// failures, which end the process (see [`McpError::is_fatal`]).
#[derive(Debug, Error)]
pub enum McpError {
    /// Parameters did not match what the method expects
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Failed to encode a value as JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or is invalid
    #[error("Config error: {0}")]
    Config(String),

    /// The toolkit factory failed to build the toolkit
    #[error("Toolkit initialization failed: {0}")]
    ToolkitInit(String),

    /// The transport could not be started or broke down
    #[error("Transport error: {0}")]
    Transport(String),
}

impl McpError {
    /// Whether this error must take the whole server down.
    ///
    /// Toolkit construction, configuration and transport failures are
    /// infrastructure errors; everything else is answered on the wire.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            McpError::Config(_) | McpError::ToolkitInit(_) | McpError::Transport(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(McpError::ToolkitInit("bad timeout".into()).is_fatal());
        assert!(McpError::Config("missing file".into()).is_fatal());
        assert!(!McpError::InvalidParams("name".into()).is_fatal());
        assert!(!McpError::Serialization("foo".into()).is_fatal());
        assert!(McpError::Transport("stdout closed".into()).is_fatal());
    }

    #[test]
    fn test_display() {
        let err = McpError::ToolkitInit("timeout must be positive".into());
        assert_eq!(
            err.to_string(),
            "Toolkit initialization failed: timeout must be positive"
        );
    }
}
