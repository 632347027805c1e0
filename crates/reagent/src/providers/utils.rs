use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use crate::models::message::{Message, ToolRequest};

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let mut converted = json!({
                "role": message.role,
                "content": message.content,
            });

            if !message.tool_calls.is_empty() {
                converted["tool_calls"] = message
                    .tool_calls
                    .iter()
                    .map(|request| {
                        json!({
                            "id": request.id,
                            "type": "function",
                            "function": {
                                "name": request.name,
                                "arguments": request.arguments,
                            }
                        })
                    })
                    .collect();
            }
            if let Some(id) = &message.tool_call_id {
                converted["tool_call_id"] = json!(id);
            }
            if let Some(name) = &message.name {
                converted["name"] = json!(name);
            }

            converted
        })
        .collect()
}

/// Convert OpenAI's API response to internal Message format
pub fn openai_response_to_message(response: Value) -> Result<Message> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| anyhow!("No message in response: {}", response))?;

    let mut message = Message::assistant();

    if let Some(text) = original.get("content").and_then(|text| text.as_str()) {
        message = message.with_text(text);
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(|calls| calls.as_array()) {
        for tool_call in tool_calls {
            let id = tool_call["id"].as_str().unwrap_or_default();
            let function_name = tool_call["function"]["name"].as_str().unwrap_or_default();
            let arguments = tool_call["function"]["arguments"]
                .as_str()
                .unwrap_or_default();

            message = message.with_tool_request(ToolRequest::new(id, function_name, arguments));
        }
    }

    Ok(message)
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}
