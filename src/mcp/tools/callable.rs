//! Native callables and the binding of JSON arguments to their parameters.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::mcp::tools::error::{ToolError, ToolResult};
use crate::mcp::tools::schema::{ParamKind, ParamSpec};

/// A native function exposed as a tool.
///
/// Implementors declare their parameter list up front; the schema
/// advertised to clients is inferred from it and from [`Callable::doc`].
pub trait Callable: Send + Sync {
    /// Identifier clients use to call the tool
    fn name(&self) -> &str;

    /// Documentation string; its first line becomes the tool description
    fn doc(&self) -> Option<&str> {
        None
    }

    /// Declared parameters, in order
    fn params(&self) -> &[ParamSpec];

    /// Runs the tool with arguments already bound to [`Callable::params`]
    fn call(&self, args: Arguments) -> ToolResult<Value>;
}

type ToolFn = dyn Fn(Arguments) -> ToolResult<Value> + Send + Sync;

/// [`Callable`] backed by a closure.
#[derive(Clone)]
pub struct FnTool {
    name: String,
    doc: Option<String>,
    params: Vec<ParamSpec>,
    func: Arc<ToolFn>,
}

impl fmt::Debug for FnTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl FnTool {
    /// Creates a tool from a name, its declared parameters and a body
    pub fn new<F>(name: impl Into<String>, params: Vec<ParamSpec>, func: F) -> Self
    where
        F: Fn(Arguments) -> ToolResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            doc: None,
            params,
            func: Arc::new(func),
        }
    }

    /// Attaches a documentation string
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Wraps the tool for registration in a toolkit
    pub fn into_callable(self) -> Arc<dyn Callable> {
        Arc::new(self)
    }
}

impl Callable for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    fn call(&self, args: Arguments) -> ToolResult<Value> {
        (self.func)(args)
    }
}

/// Arguments bound to a tool's declared parameters.
///
/// Every declared parameter is present: either supplied by the caller
/// (coerced to its kind) or filled in from its default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

impl Arguments {
    /// Binds raw call arguments to `params`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnexpectedArgument`] for names not declared,
    /// [`ToolError::MissingArguments`] listing every absent parameter that has
    /// no default, and [`ToolError::InvalidArgument`] when a value cannot be
    /// coerced to its declared kind.
    pub fn bind(params: &[ParamSpec], mut raw: Map<String, Value>) -> ToolResult<Self> {
        let declared = || params.iter().filter(|p| !p.is_receiver());

        if let Some(unknown) = raw
            .keys()
            .find(|key| !declared().any(|p| &p.name == *key))
        {
            return Err(ToolError::UnexpectedArgument(unknown.clone()));
        }

        let mut values = IndexMap::new();
        let mut missing = Vec::new();
        for param in declared() {
            match (raw.remove(&param.name), &param.default) {
                (Some(value), _) => {
                    values.insert(param.name.clone(), coerce(param, value)?);
                }
                (None, Some(default)) => {
                    values.insert(param.name.clone(), default.clone());
                }
                (None, None) => missing.push(param.name.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(ToolError::MissingArguments(missing));
        }
        Ok(Self { values })
    }

    /// Raw value of a bound parameter
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// String value of a parameter
    pub fn str(&self, name: &str) -> ToolResult<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| expected(name, ParamKind::String, self.get(name)))
    }

    /// Numeric value of a parameter
    pub fn f64(&self, name: &str) -> ToolResult<f64> {
        self.get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| expected(name, ParamKind::Number, self.get(name)))
    }

    /// Boolean value of a parameter
    pub fn bool(&self, name: &str) -> ToolResult<bool> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| expected(name, ParamKind::Boolean, self.get(name)))
    }

    /// Number of bound parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters are bound
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn expected(name: &str, kind: ParamKind, found: Option<&Value>) -> ToolError {
    ToolError::InvalidArgument {
        name: name.to_string(),
        expected: kind.schema_type(),
        found: found.map_or_else(|| "nothing".to_string(), Value::to_string),
    }
}

/// Applies the coercions the advertised schema implies. `null` is passed
/// through untouched for every kind.
fn coerce(param: &ParamSpec, value: Value) -> ToolResult<Value> {
    let kind = param.kind();
    let coerced = match (kind, value) {
        (_, Value::Null) => Some(Value::Null),
        (ParamKind::Unknown, value) => Some(value),
        (ParamKind::String, Value::String(s)) => Some(Value::String(s)),
        (ParamKind::String, value @ (Value::Number(_) | Value::Bool(_))) => {
            Some(Value::String(value.to_string()))
        }
        (ParamKind::Number, Value::Number(n)) => Some(Value::Number(n)),
        (ParamKind::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        (ParamKind::Boolean, Value::Bool(b)) => Some(Value::Bool(b)),
        (ParamKind::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (_, other) => return Err(expected(&param.name, kind, Some(&other))),
    };

    coerced.ok_or_else(|| ToolError::InvalidArgument {
        name: param.name.clone(),
        expected: kind.schema_type(),
        found: "an unparseable string".to_string(),
    })
}
