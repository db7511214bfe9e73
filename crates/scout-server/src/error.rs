use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Map a settings field path like `provider.api_key` back to the
/// environment variable a user would set, `SCOUT_PROVIDER__API_KEY`.
pub fn to_env_var(field: &str) -> String {
    format!("SCOUT_{}", field.to_uppercase().replace('.', "__"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("provider.api_key"), "SCOUT_PROVIDER__API_KEY");
        assert_eq!(to_env_var("server.port"), "SCOUT_SERVER__PORT");
    }
}
