use crate::error::{to_env_var, ConfigError};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment};
use reagent::agent::DEFAULT_MAX_ITERATIONS;
use reagent::providers::configs::{OpenAiProviderConfig, OPENAI_HOST, OPENAI_MODEL};
use serde::Deserialize;
use std::env;

/// Keys without a default; used to name the variable to set when one is missing
const REQUIRED_KEYS: &[&str] = &["provider.api_key"];

/// Where tool calls are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    /// In this process
    Local,
    /// In a tool server child process
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub host: String,
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

impl ProviderSettings {
    pub fn into_config(self) -> OpenAiProviderConfig {
        OpenAiProviderConfig {
            host: self.host,
            api_key: self.api_key,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    pub max_iterations: usize,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSettings {
    pub mode: ToolMode,
    pub server_command: String,
    #[serde(default)]
    pub server_args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub provider: ProviderSettings,
    pub agent: AgentSettings,
    pub tools: ToolsSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = openai_fallbacks(default_settings()?)?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("REAGENT")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(" ")
                    .with_list_parse_key("tools.server_args")
                    .try_parsing(true),
            )
            .build()?;

        match config.try_deserialize::<Self>() {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if let Some(field) = missing_field(&error_str) {
                    let key = REQUIRED_KEYS
                        .iter()
                        .find(|key| key.rsplit('.').next() == Some(field))
                        .map(|key| key.to_string())
                        .unwrap_or_else(|| field.to_string());
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(&key),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_settings() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("provider.host", OPENAI_HOST)?
        .set_default("provider.model", OPENAI_MODEL)?
        .set_default("agent.max_iterations", DEFAULT_MAX_ITERATIONS as i64)?
        .set_default("agent.system_prompt", default_system_prompt())?
        .set_default("tools.mode", "local")?
        .set_default("tools.server_command", default_server_command())?
        .set_default("tools.server_args", Vec::<String>::new())?)
}

// The standard OpenAI variables sit between the defaults and REAGENT_* overrides
fn openai_fallbacks(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder;
    if let Ok(api_key) = env::var("OPENAI_API_KEY") {
        builder = builder.set_default("provider.api_key", api_key)?;
    }
    if let Ok(host) = env::var("OPENAI_API_HOST") {
        builder = builder.set_default("provider.host", host)?;
    }
    Ok(builder)
}

// Extract the field name from "missing field `api_key`"
fn missing_field(message: &str) -> Option<&str> {
    let start = message.find("missing field `")? + "missing field `".len();
    let rest = &message[start..];
    rest.find('`').map(|end| &rest[..end])
}

pub fn default_system_prompt() -> String {
    "You are a helpful AI assistant.".to_string()
}

fn default_server_command() -> String {
    "reagent-tools-server".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("REAGENT_") {
                env::remove_var(&key);
            }
        }
        env::remove_var("OPENAI_API_KEY");
        env::remove_var("OPENAI_API_HOST");
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        env::set_var("REAGENT_PROVIDER__API_KEY", "test-key");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.provider.host, "https://api.openai.com");
        assert_eq!(settings.provider.api_key, "test-key");
        assert_eq!(settings.provider.model, "gpt-4o");
        assert_eq!(settings.provider.temperature, None);
        assert_eq!(settings.provider.max_tokens, None);
        assert_eq!(settings.agent.max_iterations, 10);
        assert_eq!(settings.agent.system_prompt, "You are a helpful AI assistant.");
        assert_eq!(settings.tools.mode, ToolMode::Local);
        assert_eq!(settings.tools.server_command, "reagent-tools-server");
        assert!(settings.tools.server_args.is_empty());

        env::remove_var("REAGENT_PROVIDER__API_KEY");
    }

    #[test]
    #[serial]
    fn test_openai_fallbacks() {
        clean_env();
        env::set_var("OPENAI_API_KEY", "openai-key");
        env::set_var("OPENAI_API_HOST", "https://proxy.example.com");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.provider.api_key, "openai-key");
        assert_eq!(settings.provider.host, "https://proxy.example.com");

        // Prefixed variables win over the fallbacks
        env::set_var("REAGENT_PROVIDER__API_KEY", "reagent-key");
        let settings = Settings::new().unwrap();
        assert_eq!(settings.provider.api_key, "reagent-key");

        clean_env();
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        clean_env();
        env::set_var("REAGENT_PROVIDER__API_KEY", "test-key");
        env::set_var("REAGENT_PROVIDER__MODEL", "gpt-4o-mini");
        env::set_var("REAGENT_PROVIDER__TEMPERATURE", "0.8");
        env::set_var("REAGENT_PROVIDER__MAX_TOKENS", "512");
        env::set_var("REAGENT_AGENT__MAX_ITERATIONS", "4");
        env::set_var("REAGENT_TOOLS__MODE", "remote");
        env::set_var("REAGENT_TOOLS__SERVER_COMMAND", "/usr/local/bin/tools");
        env::set_var("REAGENT_TOOLS__SERVER_ARGS", "--flag value");

        let settings = Settings::new().unwrap();
        assert_eq!(settings.provider.model, "gpt-4o-mini");
        assert_eq!(settings.provider.temperature, Some(0.8));
        assert_eq!(settings.provider.max_tokens, Some(512));
        assert_eq!(settings.agent.max_iterations, 4);
        assert_eq!(settings.tools.mode, ToolMode::Remote);
        assert_eq!(settings.tools.server_command, "/usr/local/bin/tools");
        assert_eq!(settings.tools.server_args, vec!["--flag", "value"]);

        clean_env();
    }

    #[test]
    #[serial]
    fn test_missing_api_key() {
        clean_env();

        let error = Settings::new().unwrap_err();
        match error {
            ConfigError::MissingEnvVar { env_var } => {
                assert_eq!(env_var, "REAGENT_PROVIDER__API_KEY")
            }
            other => panic!("Expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(missing_field("missing field `api_key`"), Some("api_key"));
        assert_eq!(missing_field("invalid type"), None);
    }
}
