pub mod database;

pub use database::{DatabaseToolset, DbConfig, QuerySpec};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ToolResult;
use crate::models::{Tool, ToolCall};

/// A named group of tools the agent may call.
///
/// Implementations declare their tools as a capability table (name plus JSON
/// schema) and dispatch calls by name. The agent decides when and whether to
/// invoke them; nothing in this crate sequences tool calls itself.
#[async_trait]
pub trait Toolset: Send + Sync {
    /// Get the name of the toolset
    fn name(&self) -> &str;

    /// Get the toolset description
    fn description(&self) -> &str;

    /// Usage instructions appended to the agent's system prompt
    fn instructions(&self) -> &str;

    /// Get available tools
    fn tools(&self) -> &[Tool];

    /// Call a tool with the given parameters
    async fn call(&self, tool_call: ToolCall) -> ToolResult<Value>;
}
