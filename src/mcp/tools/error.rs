use thiserror::Error;

/// Result alias for tool invocations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Failure raised while binding arguments to a tool or while running it.
///
/// The `Display` text is what clients see after the
/// `Error calling tool <name>: ` prefix.
#[derive(Debug, Error)]
pub enum ToolError {
    /// One or more parameters without a default were not supplied
    #[error("missing required argument(s): {}", .0.join(", "))]
    MissingArguments(Vec<String>),

    /// The request named a parameter the tool does not declare
    #[error("got an unexpected argument '{0}'")]
    UnexpectedArgument(String),

    /// A value could not be coerced to the declared kind
    #[error("argument '{name}' must be a {expected}, got {found}")]
    InvalidArgument {
        /// Parameter name
        name: String,
        /// Schema type the parameter declares
        expected: &'static str,
        /// Rendering of the offending value
        found: String,
    },

    /// The tool ran and reported a failure
    #[error("{0}")]
    Execution(String),

    /// A terminal tool named a session that does not exist
    #[error("No shell session with id '{0}'")]
    UnknownSession(String),

    /// IO error raised by the tool
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Shorthand for [`ToolError::Execution`].
    pub fn execution(message: impl Into<String>) -> Self {
        ToolError::Execution(message.into())
    }
}
