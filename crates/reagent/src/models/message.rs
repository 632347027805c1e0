use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::role::Role;
use super::tool::{ToolCall, ToolResult};
use crate::errors::{AgentError, AgentResult};

/// A tool call as emitted by the model: the arguments are kept as the raw text the
/// model produced, so the conversation replays exactly what was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolRequest {
    pub fn new<I, N, A>(id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Decode the raw arguments into a ToolCall. Arguments must be a JSON object.
    pub fn tool_call(&self) -> AgentResult<ToolCall> {
        let arguments: Value = serde_json::from_str(&self.arguments).map_err(|e| {
            AgentError::InvalidParameters(format!(
                "Could not interpret tool use parameters for id {}: {}",
                self.id, e
            ))
        })?;
        if !arguments.is_object() {
            return Err(AgentError::InvalidParameters(format!(
                "Tool use parameters for id {} must be a JSON object",
                self.id
            )));
        }
        Ok(ToolCall::new(&self.name, arguments))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn with_role(role: Role) -> Self {
        Message {
            role,
            content: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a new system message with the given instructions
    pub fn system<S: Into<String>>(text: S) -> Self {
        Self::with_role(Role::System).with_text(text)
    }

    /// Create a new user message
    pub fn user() -> Self {
        Self::with_role(Role::User)
    }

    /// Create a new assistant message
    pub fn assistant() -> Self {
        Self::with_role(Role::Assistant)
    }

    /// Create a tool message answering the request with the given id
    pub fn tool<I: Into<String>, N: Into<String>>(tool_call_id: I, name: N) -> Self {
        Message {
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Self::with_role(Role::Tool)
        }
    }

    /// Build the tool message for an executed request
    pub fn tool_result(request: &ToolRequest, result: ToolResult) -> Self {
        Self::tool(result.id, &request.name).with_text(result.payload)
    }

    /// Set the text content of the message
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.content = Some(text.into());
        self
    }

    /// Add a tool request to the message
    pub fn with_tool_request(mut self, request: ToolRequest) -> Self {
        self.tool_calls.push(request);
        self
    }

    pub fn has_tool_requests(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn text(&self) -> Option<&str> {
        self.content.as_deref()
    }
}
