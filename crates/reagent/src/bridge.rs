//! Converts tool listings into the function-calling declarations sent to the model.
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;

/// Build one `{"type": "function", ...}` declaration per tool, in input order.
///
/// A missing description becomes an empty string; the input schema is passed through
/// unchanged as the function parameters.
pub fn tools_to_function_specs(tools: &[Tool]) -> AgentResult<Vec<Value>> {
    let mut tool_names = HashSet::new();
    let mut result = Vec::with_capacity(tools.len());

    for tool in tools {
        if !tool_names.insert(tool.name.as_str()) {
            return Err(AgentError::Internal(format!(
                "Duplicate tool name: {}",
                tool.name
            )));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description.as_deref().unwrap_or_default(),
                "parameters": tool.input_schema,
            }
        }));
    }

    Ok(result)
}
