use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool that can be used by a model.
///
/// The serialized form matches a tool server's capability listing, so the same type
/// describes local registry entries and remote tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// A JSON Schema object defining the expected parameters for the tool
    pub input_schema: Value,
}

impl Tool {
    /// Create a new tool with the given name and description
    pub fn new<N, D>(name: N, description: D, input_schema: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        }
    }

    /// Create a tool without a description
    pub fn undescribed<N: Into<String>>(name: N, input_schema: Value) -> Self {
        Tool {
            name: name.into(),
            description: None,
            input_schema,
        }
    }
}

/// A decoded tool call that a transport can execute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// The name of the tool to execute
    pub name: String,
    /// The arguments for the execution
    pub arguments: Value,
}

impl ToolCall {
    /// Create a new ToolCall with the given name and arguments
    pub fn new<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The serialized outcome of one tool call, linked to the request it answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub id: String,
    pub payload: String,
}

impl ToolResult {
    pub fn new<I: Into<String>, P: Into<String>>(id: I, payload: P) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_listing_format() {
        let tool: Tool = serde_json::from_value(json!({
            "name": "echo",
            "inputSchema": {"type": "object", "properties": {}}
        }))
        .unwrap();
        assert_eq!(tool.name, "echo");
        assert_eq!(tool.description, None);

        let value = serde_json::to_value(Tool::new("echo", "Echo", json!({}))).unwrap();
        assert_eq!(
            value,
            json!({"name": "echo", "description": "Echo", "inputSchema": {}})
        );
    }
}
