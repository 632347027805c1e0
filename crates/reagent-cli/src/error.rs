use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets a configuration key, e.g. `provider.api_key` is
/// read from `REAGENT_PROVIDER__API_KEY`
pub fn to_env_var(key: &str) -> String {
    format!("REAGENT_{}", key.replace('.', "__").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("provider.api_key"), "REAGENT_PROVIDER__API_KEY");
        assert_eq!(to_env_var("model"), "REAGENT_MODEL");
    }
}
