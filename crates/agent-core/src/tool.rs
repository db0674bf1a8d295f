//! Tool System
//!
//! Extensible tool framework for agent capabilities.
//! Tools are registered once at startup and invoked by the turn loop.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Raw tool-call request as it arrives from the completion endpoint
///
/// `arguments` is the serialized JSON text exactly as the model produced
/// it and may be malformed; it is only parsed at dispatch time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Call ID, echoed back on the matching tool-result message
    pub id: String,

    /// Tool identifier
    pub name: String,

    /// Serialized argument object, unparsed
    pub arguments: String,
}

/// Parsed tool invocation handed to a handler
#[derive(Clone, Debug)]
pub struct ToolCall {
    /// Call ID from the originating request
    pub id: String,

    /// Arguments as key-value pairs
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Fetch a string argument, trimmed, treating absent and empty alike
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID from the originating request
    pub id: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (result text or error string)
    pub output: String,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: String::new(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: String::new(),
            success: false,
            output: error.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// Render the parameters as the JSON-Schema object the wire expects
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = Map::new();
            prop.insert("type".into(), Value::String(param.param_type.clone()));
            prop.insert(
                "description".into(),
                Value::String(param.description.clone()),
            );
            if let Some(values) = &param.enum_values {
                prop.insert("enum".into(), Value::Array(values.clone()));
            }
            properties.insert(param.name.clone(), Value::Object(prop));

            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool trait - implement to add new capabilities
///
/// Contract: handlers convert their own internal failures into a
/// descriptive text result (`ToolResult::failure`) rather than returning
/// `Err`. An `Err` is still tolerated by the registry, which rewrites it
/// into an error string, so the turn loop never observes a failure here.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;
}

/// Registry for available tools
///
/// Lookup is by exact name; schema export preserves registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    ///
    /// Re-registering an existing name replaces the handler in place,
    /// keeping its original position in the schema order.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_boxed(Arc::new(tool));
    }

    /// Register a boxed tool
    pub fn register_boxed(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        if let Some(&slot) = self.index.get(&name) {
            self.tools[slot] = tool;
        } else {
            self.index.insert(name, self.tools.len());
            self.tools.push(tool);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&slot| self.tools[slot].clone())
    }

    /// Get all tool schemas, in registration order
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Get wire-shaped descriptors for every tool, in registration order
    pub fn descriptors(&self) -> Vec<crate::provider::ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| crate::provider::ToolDescriptor::from(&t.schema()))
            .collect()
    }

    /// Get tool names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.schema().name).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch a raw request to the named tool
    ///
    /// Never fails: an unknown name, unparsable arguments, or a handler
    /// error all come back as a `ToolResult` whose output is a
    /// human-readable string for the model to read.
    pub async fn dispatch(&self, request: &ToolCallRequest) -> ToolResult {
        let Some(tool) = self.get(&request.name) else {
            return ToolResult::failure(
                &request.name,
                format!("Error: unknown tool '{}'.", request.name),
            )
            .with_id(&request.id);
        };

        let arguments = parse_arguments(&request.name, &request.arguments);
        let call = ToolCall {
            id: request.id.clone(),
            arguments,
        };

        match tool.execute(&call).await {
            Ok(result) => result.with_id(&request.id),
            Err(e) => ToolResult::failure(&request.name, format!("Error: {e}"))
                .with_id(&request.id),
        }
    }
}

/// Parse raw argument text, substituting an empty set on failure
fn parse_arguments(tool: &str, raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Map<String, Value>>(raw) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(tool, error = %e, "malformed tool arguments, using empty set");
            Map::new()
        }
    }
}
