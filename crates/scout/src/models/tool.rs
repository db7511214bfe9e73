use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Name under which the hosted web-search capability is declared.
pub const WEB_SEARCH_TOOL: &str = "web_search";

/// A tool the agent may call, declared with a JSON schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema for the parameters the tool accepts
    pub input_schema: Value,
}

impl Tool {
    pub fn new<N, D>(name: N, description: D, input_schema: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// The web-search capability hosted by the agent service. It is declared
    /// alongside the function tools but executed upstream, never dispatched
    /// locally.
    pub fn web_search() -> Self {
        Tool::new(
            WEB_SEARCH_TOOL,
            "Search the web for current information.",
            json!({"type": "object", "properties": {}}),
        )
    }
}

/// A tool call requested by the agent service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// The name of the tool to execute
    pub name: String,
    /// The arguments for the execution
    pub arguments: Value,
}

impl ToolCall {
    pub fn new<S: Into<String>>(name: S, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}
