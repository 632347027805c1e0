use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{CompletionOptions, Provider, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    check_openai_context_length_error, messages_to_openai_spec, openai_response_to_message,
};
use crate::bridge::tools_to_function_specs;
use crate::models::message::Message;
use crate::models::tool::Tool;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn get_usage(data: &Value) -> Usage {
        let Some(usage) = data.get("usage") else {
            return Usage::default();
        };

        let input_tokens = usage
            .get("prompt_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let output_tokens = usage
            .get("completion_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let total_tokens = usage
            .get("total_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
            .or_else(|| match (input_tokens, output_tokens) {
                (Some(input), Some(output)) => Some(input + output),
                _ => None,
            });

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                // The body usually carries an error object worth surfacing
                let body = response.text().await.unwrap_or_default();
                if let Ok(Value::Object(data)) = serde_json::from_str::<Value>(&body) {
                    if let Some(error) = data.get("error") {
                        if let Some(err) = check_openai_context_length_error(error) {
                            return Err(err.into());
                        }
                    }
                }
                Err(anyhow!("Request failed: {}\nBody: {}", status, body))
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[Tool],
        options: &CompletionOptions,
    ) -> Result<(Message, Usage)> {
        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_to_openai_spec(messages),
        });
        let body = payload
            .as_object_mut()
            .ok_or_else(|| anyhow!("payload must be an object"))?;

        // tool_choice and parallel_tool_calls are only accepted alongside tools
        if !tools.is_empty() {
            body.insert("tools".to_string(), json!(tools_to_function_specs(tools)?));
            body.insert("tool_choice".to_string(), json!(options.tool_choice));
            body.insert(
                "parallel_tool_calls".to_string(),
                json!(options.parallel_tool_calls),
            );
        }
        if let Some(temp) = self.config.temperature {
            body.insert("temperature".to_string(), json!(temp));
        }
        if let Some(tokens) = self.config.max_tokens {
            body.insert("max_tokens".to_string(), json!(tokens));
        }

        tracing::debug!(model = %self.config.model, messages = messages.len(), "requesting completion");
        let response = self.post(payload).await?;

        // Raise specific error if context length is exceeded
        if let Some(error) = response.get("error") {
            if let Some(err) = check_openai_context_length_error(error) {
                return Err(err.into());
            }
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        let usage = Self::get_usage(&response);
        let message = openai_response_to_message(response)?;

        Ok((message, usage))
    }
}
