use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use scout::gateway::GatewayConfig;
use scout::providers::configs::{OPENAI_DEFAULT_MODEL, OPENAI_HOST};
use scout::toolsets::DbConfig;
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port).parse().map_err(|_| {
            ConfigError::Other(config::ConfigError::Message(format!(
                "invalid server address {}:{}",
                self.host, self.port
            )))
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub host: String,
    /// No default; the gateway falls back to `OPENAI_API_KEY` and fails
    /// fast when neither is set.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            host: OPENAI_HOST.to_string(),
            api_key: None,
            model: OPENAI_DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Off by default; the database tools are only declared when enabled.
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "scout".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub database: DatabaseSettings,
}

impl Settings {
    /// Read settings once at process start from `SCOUT_`-prefixed
    /// environment variables layered over the documented defaults. Not
    /// re-read per request.
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("SCOUT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();

        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
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

    /// Convert to the core gateway configuration.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            api_key: self.provider.api_key.clone(),
            host: self.provider.host.clone(),
            model: self.provider.model.clone(),
            temperature: self.provider.temperature,
            max_tokens: self.provider.max_tokens,
            database: self.database.enabled.then(|| DbConfig {
                host: self.database.host.clone(),
                port: self.database.port,
                user: self.database.user.clone(),
                password: self.database.password.clone(),
                database: self.database.database.clone(),
            }),
        }
    }
}
