//! Capability schema inference.
//!
//! A tool's advertised schema is derived from its declared parameter list
//! and documentation string; tools never describe themselves in protocol
//! terms.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::mcp::tools::callable::Callable;
use crate::mcp::tools::models::Tool;

/// Schema vocabulary a declared type tag maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Text
    String,
    /// Integer or floating point
    Number,
    /// true / false
    Boolean,
    /// Untyped or unclassifiable; advertised as a string
    Unknown,
}

impl ParamKind {
    /// Classifies a declared type tag.
    ///
    /// Anything that is not recognisably a string, number or boolean
    /// (including a missing tag) is [`ParamKind::Unknown`].
    pub fn from_type_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return ParamKind::Unknown;
        };
        match tag.trim() {
            "str" | "string" | "String" | "&str" | "char" | "path" | "PathBuf" => ParamKind::String,
            "int" | "float" | "integer" | "number" | "i8" | "i16" | "i32" | "i64" | "i128"
            | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize" | "f32" | "f64" => {
                ParamKind::Number
            }
            "bool" | "boolean" => ParamKind::Boolean,
            _ => ParamKind::Unknown,
        }
    }

    /// JSON Schema `type` keyword advertised for this kind
    pub fn schema_type(self) -> &'static str {
        match self {
            ParamKind::String | ParamKind::Unknown => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }
}

impl Serialize for ParamKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.schema_type())
    }
}

/// A parameter as declared by the tool author
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Optional type tag, e.g. `"str"` or `"f64"`
    pub type_tag: Option<String>,
    /// Default value; parameters with one are optional
    pub default: Option<Value>,
    /// Human-readable description
    pub description: Option<String>,
}

impl ParamSpec {
    /// Creates an untyped, required parameter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: None,
            default: None,
            description: None,
        }
    }

    /// Sets the type tag
    pub fn typed(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    /// Sets the default value, making the parameter optional
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Classified kind of the type tag
    pub fn kind(&self) -> ParamKind {
        ParamKind::from_type_tag(self.type_tag.as_deref())
    }

    /// Whether this is the implicit receiver, which is never advertised
    pub fn is_receiver(&self) -> bool {
        self.name == "self"
    }
}

/// Advertised schema of one parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSchema {
    /// Classified kind
    #[serde(rename = "type")]
    pub kind: ParamKind,
    /// Never empty
    pub description: String,
    /// Present only when the parameter declares a default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Capability descriptor advertised for a tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    /// Tool identifier
    pub name: String,
    /// First line of the documentation
    pub description: String,
    /// Parameter schemas in declaration order
    pub parameters: IndexMap<String, ParameterSchema>,
    /// Parameters without a default, in declaration order
    pub required: Vec<String>,
}

impl ToolDescriptor {
    /// JSON Schema object describing the tool's input
    pub fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": self.parameters,
            "required": self.required,
        })
    }

    /// Wire representation used in `tools/list`
    pub fn to_tool(&self) -> Tool {
        Tool::new(&self.name, &self.description, self.input_schema())
    }
}

/// Derives the capability descriptor for `callable`.
pub fn infer(callable: &dyn Callable) -> ToolDescriptor {
    let name = callable.name().to_string();

    let description = match callable.doc().filter(|doc| !doc.is_empty()) {
        Some(doc) => doc.lines().next().unwrap_or_default().trim().to_string(),
        None => format!("Execute {}", name),
    };

    let mut parameters = IndexMap::new();
    let mut required = Vec::new();
    for param in callable.params().iter().filter(|p| !p.is_receiver()) {
        let description = param
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map_or_else(|| format!("Parameter {}", param.name), str::to_string);

        if param.default.is_none() {
            required.push(param.name.clone());
        }
        parameters.insert(
            param.name.clone(),
            ParameterSchema {
                kind: param.kind(),
                description,
                default: param.default.clone(),
            },
        );
    }

    ToolDescriptor {
        name,
        description,
        parameters,
        required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::callable::FnTool;
    use proptest::prelude::*;

    fn shell_exec() -> FnTool {
        FnTool::new(
            "shell_exec",
            vec![
                ParamSpec::new("self"),
                ParamSpec::new("id").typed("str").describe("Session identifier"),
                ParamSpec::new("command").typed("str"),
                ParamSpec::new("block").typed("bool").with_default(json!(true)),
                ParamSpec::new("timeout").typed("float").with_default(json!(20.0)),
                ParamSpec::new("env"),
            ],
            |_| Ok(Value::Null),
        )
        .with_doc("Executes a shell command.\n\n    Args:\n        id: session")
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(ParamKind::from_type_tag(Some("str")), ParamKind::String);
        assert_eq!(ParamKind::from_type_tag(Some("int")), ParamKind::Number);
        assert_eq!(ParamKind::from_type_tag(Some("f64")), ParamKind::Number);
        assert_eq!(ParamKind::from_type_tag(Some("bool")), ParamKind::Boolean);
        assert_eq!(ParamKind::from_type_tag(Some("List[str]")), ParamKind::Unknown);
        assert_eq!(ParamKind::from_type_tag(None), ParamKind::Unknown);
        assert_eq!(ParamKind::Unknown.schema_type(), "string");
    }

    #[test]
    fn test_infer_descriptor() {
        let descriptor = infer(&shell_exec());

        assert_eq!(descriptor.name, "shell_exec");
        assert_eq!(descriptor.description, "Executes a shell command.");
        assert_eq!(
            descriptor.parameters.keys().collect::<Vec<_>>(),
            vec!["id", "command", "block", "timeout", "env"]
        );
        assert_eq!(descriptor.required, vec!["id", "command", "env"]);
        assert_eq!(descriptor.parameters["id"].description, "Session identifier");
        assert_eq!(descriptor.parameters["command"].description, "Parameter command");
        assert_eq!(descriptor.parameters["block"].default, Some(json!(true)));
        assert_eq!(descriptor.parameters["env"].kind, ParamKind::Unknown);
    }

    #[test]
    fn test_missing_doc_falls_back() {
        let tool = FnTool::new("shell_view", vec![], |_| Ok(Value::Null));
        assert_eq!(infer(&tool).description, "Execute shell_view");

        let tool = FnTool::new("shell_view", vec![], |_| Ok(Value::Null)).with_doc("");
        assert_eq!(infer(&tool).description, "Execute shell_view");
    }

    #[test]
    fn test_leading_blank_doc_line() {
        let tool = FnTool::new("t", vec![], |_| Ok(Value::Null)).with_doc("\n  Real text");
        assert_eq!(infer(&tool).description, "");
    }

    #[test]
    fn test_input_schema_shape() {
        let schema = infer(&shell_exec()).input_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["env"]["type"], "string");
        assert_eq!(schema["properties"]["block"]["type"], "boolean");
        assert_eq!(schema["properties"]["timeout"]["type"], "number");
        assert_eq!(schema["properties"]["timeout"]["default"], json!(20.0));
        assert!(schema["properties"]["id"].get("default").is_none());
        assert_eq!(schema["required"], json!(["id", "command", "env"]));
    }

    proptest! {
        #[test]
        fn required_is_exactly_params_without_default(
            defaults in proptest::collection::vec(any::<Option<bool>>(), 0..12)
        ) {
            let params: Vec<ParamSpec> = defaults
                .iter()
                .enumerate()
                .map(|(i, default)| {
                    let spec = ParamSpec::new(format!("p{}", i)).typed("bool");
                    match default {
                        Some(value) => spec.with_default(json!(value)),
                        None => spec,
                    }
                })
                .collect();
            let expected: Vec<String> = params
                .iter()
                .filter(|p| p.default.is_none())
                .map(|p| p.name.clone())
                .collect();

            let descriptor = infer(&FnTool::new("generated", params.clone(), |_| Ok(Value::Null)));

            prop_assert_eq!(descriptor.parameters.len(), params.len());
            prop_assert_eq!(&descriptor.required, &expected);
            for name in &descriptor.required {
                prop_assert!(descriptor.parameters.contains_key(name));
            }
            for schema in descriptor.parameters.values() {
                prop_assert!(!schema.description.is_empty());
            }
        }
    }
}
