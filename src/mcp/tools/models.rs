use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Represents a single tool as advertised in `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Unique identifier for the tool
    pub name: String,

    /// Human-readable description of functionality
    pub description: String,

    /// JSON Schema defining expected parameters
    pub input_schema: Value,
}

impl Tool {
    /// Creates a new tool with the given name, description, and input schema
    pub fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// A content block of a tool response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolResultContent {
    /// Text content
    #[serde(rename = "text")]
    Text {
        /// The text content
        text: String,
    },
}

/// Response to a `tools/call` request.
///
/// Always holds exactly one text block: the stringified result on success,
/// or a human-readable error message. Failures are not flagged separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResponse {
    /// Content blocks of the response
    pub content: Vec<ToolResultContent>,
}

impl CallResponse {
    /// Creates a response holding a single text block
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::Text { text: text.into() }],
        }
    }

    /// Text of the first block, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|block| match block {
            ToolResultContent::Text { text } => text.as_str(),
        })
    }
}
