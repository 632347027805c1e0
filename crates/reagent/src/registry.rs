use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;

lazy_static! {
    static ref TOOL_NAME: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// An in-process tool body. Arguments arrive as the decoded JSON object of the call.
pub type ToolHandler = Box<dyn Fn(&Value) -> AgentResult<Value> + Send + Sync>;

pub fn is_valid_tool_name(name: &str) -> bool {
    TOOL_NAME.is_match(name)
}

/// Maps tool names to their descriptor and in-process implementation.
///
/// Built once at startup and read-only afterwards; share it behind an `Arc`.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    handlers: Vec<ToolHandler>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool and its implementation
    pub fn register<F>(&mut self, tool: Tool, handler: F) -> AgentResult<()>
    where
        F: Fn(&Value) -> AgentResult<Value> + Send + Sync + 'static,
    {
        if !is_valid_tool_name(&tool.name) {
            return Err(AgentError::Internal(format!(
                "The tool name '{}' has invalid characters, it must match [a-zA-Z0-9_-]+",
                tool.name
            )));
        }
        if self.index.contains_key(&tool.name) {
            return Err(AgentError::Internal(format!(
                "Duplicate tool name: {}",
                tool.name
            )));
        }

        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(tool);
        self.handlers.push(Box::new(handler));
        Ok(())
    }

    /// Builder-style variant of `register`
    pub fn with_tool<F>(mut self, tool: Tool, handler: F) -> AgentResult<Self>
    where
        F: Fn(&Value) -> AgentResult<Value> + Send + Sync + 'static,
    {
        self.register(tool, handler)?;
        Ok(self)
    }

    /// Look up a tool descriptor by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// All registered tools in registration order
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke the named tool synchronously
    pub fn call(&self, name: &str, arguments: &Value) -> AgentResult<Value> {
        let handler = self
            .index
            .get(name)
            .map(|&i| &self.handlers[i])
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        handler(arguments)
    }
}
