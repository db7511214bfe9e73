//! The synchronous facade over the agent: one blocking `ask` per request,
//! each in its own execution context.

use anyhow::Result;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::agent::Agent;
use crate::guardrail::{self, GuardrailOutput};
use crate::providers::base::Provider;
use crate::providers::configs::{OpenAiProviderConfig, OPENAI_DEFAULT_MODEL, OPENAI_HOST};
use crate::providers::openai::OpenAiProvider;
use crate::render;
use crate::toolsets::{DatabaseToolset, DbConfig};

pub const SEARCH_INSTRUCTIONS: &str = "\
You are a helpful assistant that can search the web for information and \
answer questions accurately. Provide concise, informative responses.";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(
        "an API key must be provided or set via the OPENAI_API_KEY environment variable"
    )]
    MissingApiKey,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Explicit API key; falls back to `OPENAI_API_KEY` when `None`.
    pub api_key: Option<String>,
    pub host: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
    /// When set, the read-only MySQL tools are declared to the agent and the
    /// SQL guardrail runs on incoming messages.
    pub database: Option<DbConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            host: OPENAI_HOST.to_string(),
            model: OPENAI_DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
            database: None,
        }
    }
}

/// Read-only after construction; safe to share across request handlers.
pub struct Gateway {
    agent: Agent,
    guard_input: bool,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("guard_input", &self.guard_input)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Build the gateway once at process start. Fails fast when no API key
    /// is available.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or(GatewayError::MissingApiKey)?;

        let provider = OpenAiProvider::new(OpenAiProviderConfig {
            host: config.host,
            api_key,
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })?;

        Ok(Self::with_provider(Box::new(provider), config.database))
    }

    /// Wire the gateway onto an arbitrary provider. Used by tests and by
    /// callers that bring their own service client.
    pub fn with_provider(provider: Box<dyn Provider>, database: Option<DbConfig>) -> Self {
        let guard_input = database.is_some();
        let mut agent = Agent::new(provider, SEARCH_INSTRUCTIONS);
        if let Some(db) = database {
            agent.add_toolset(Box::new(DatabaseToolset::new(db)));
        }
        Self { agent, guard_input }
    }

    /// Run the guardrail over a raw user message. Only active when the
    /// database tools are enabled; a pure web-search gateway has nothing to
    /// protect.
    pub fn check_input(&self, message: &str) -> GuardrailOutput {
        if self.guard_input {
            guardrail::check_sql_injection(message)
        } else {
            GuardrailOutput {
                tripped: false,
                matched: None,
            }
        }
    }

    /// Ask a question and get the answer as an HTML fragment.
    ///
    /// Blocks the calling thread on a runtime built fresh for this call, so
    /// concurrent calls on a shared gateway never share pending-task state.
    /// Must not be called from inside an async context; request handlers run
    /// it under `spawn_blocking`. There is no overall timeout on the agent
    /// run, only the HTTP client's per-request timeout.
    pub fn ask(&self, question: &str) -> Result<String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let answer = runtime.block_on(self.agent.run(question))?;
        Ok(render::normalize(&answer))
    }

    /// Stream the raw answer as text fragments, one per agent turn. Finite
    /// and not restartable. Fragments are plain text; normalization is for
    /// the web surface.
    pub fn ask_stream<'a>(&'a self, question: &str) -> BoxStream<'a, Result<String>> {
        self.agent.run_streamed(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;
    use crate::providers::mock::MockProvider;
    use serial_test::serial;

    fn gateway_with(responses: Vec<Message>, database: Option<DbConfig>) -> Gateway {
        Gateway::with_provider(Box::new(MockProvider::new(responses)), database)
    }

    #[test]
    fn test_ask_normalizes_the_answer() {
        let gateway = gateway_with(vec![Message::assistant().with_text("hello")], None);
        assert_eq!(gateway.ask("hi").unwrap(), "<p>hello</p>\n");
    }

    #[test]
    fn test_ask_rewrites_citations() {
        let gateway = gateway_with(
            vec![Message::assistant().with_text("See ([x.com](https://x.com/a)) for more.")],
            None,
        );
        let html = gateway.ask("hi").unwrap();
        assert!(html.contains("<a href=\"https://x.com/a\" target=\"_blank\">https://x.com/a</a>"));
    }

    #[test]
    fn test_guardrail_inactive_without_database_tools() {
        let gateway = gateway_with(vec![], None);
        assert!(!gateway.check_input("DROP TABLE users").tripped);
    }

    #[test]
    fn test_guardrail_active_with_database_tools() {
        let gateway = gateway_with(vec![], Some(DbConfig::default()));
        assert!(gateway.check_input("DROP TABLE users").tripped);
        assert!(!gateway.check_input("how many customers are there?").tripped);
    }

    #[test]
    #[serial]
    fn test_new_fails_fast_without_api_key() {
        let saved = std::env::var("OPENAI_API_KEY").ok();
        std::env::remove_var("OPENAI_API_KEY");

        let result = Gateway::new(GatewayConfig::default());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("OPENAI_API_KEY"));

        if let Some(key) = saved {
            std::env::set_var("OPENAI_API_KEY", key);
        }
    }

    #[test]
    #[serial]
    fn test_new_accepts_explicit_api_key() {
        std::env::remove_var("OPENAI_API_KEY");
        let config = GatewayConfig {
            api_key: Some("test-key".to_string()),
            ..GatewayConfig::default()
        };
        assert!(Gateway::new(config).is_ok());
    }
}
