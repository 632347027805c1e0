use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// How the model may pick tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
}

/// Per-request directives sent along with the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub tool_choice: ToolChoice,
    pub parallel_tool_calls: bool,
}

impl Default for CompletionOptions {
    /// Tools are picked automatically, one logical turn at a time
    fn default() -> Self {
        Self {
            tool_choice: ToolChoice::Auto,
            parallel_tool_calls: false,
        }
    }
}

/// Base trait for model endpoints
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next assistant message for the conversation
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
        options: &CompletionOptions,
    ) -> Result<(Message, Usage)>;
}
