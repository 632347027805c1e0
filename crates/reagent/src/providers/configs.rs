use anyhow::{anyhow, Result};
use std::env;

pub const OPENAI_HOST: &str = "https://api.openai.com";
pub const OPENAI_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenAiProviderConfig {
    pub fn new<K: Into<String>>(api_key: K) -> Self {
        Self {
            host: OPENAI_HOST.to_string(),
            api_key: api_key.into(),
            model: OPENAI_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Load configuration from the standard OpenAI environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = get_env("OPENAI_API_KEY", true, None)?
            .ok_or_else(|| anyhow!("OpenAI API key should be present"))?;
        let host = get_env("OPENAI_API_HOST", false, Some(OPENAI_HOST.to_string()))?
            .unwrap_or_else(|| OPENAI_HOST.to_string());
        let model = get_env("OPENAI_MODEL", false, Some(OPENAI_MODEL.to_string()))?
            .unwrap_or_else(|| OPENAI_MODEL.to_string());

        Ok(Self {
            host,
            api_key,
            model,
            temperature: None,
            max_tokens: None,
        })
    }
}

/// Read an environment variable, falling back to `default` when it is optional
fn get_env(key: &str, required: bool, default: Option<String>) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) if !required => Ok(default),
        Err(env::VarError::NotPresent) => Err(anyhow!(
            "Environment variable '{}' is required but not set.",
            key
        )),
        Err(e) => Err(e.into()),
    }
}
