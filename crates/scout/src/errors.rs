use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised at the tool dispatch boundary.
///
/// These never cross the toolset `call` boundary as panics or database
/// errors: anything that happens while talking to the database is converted
/// into the tool's declared return shape instead, because the consumer is an
/// autonomous agent that can only react to what it reads back.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),
}

pub type ToolResult<T> = Result<T, ToolError>;
