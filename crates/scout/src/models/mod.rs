pub mod message;
pub mod tool;

pub use message::{Message, MessageContent, Role, ToolRequest, ToolResponse};
pub use tool::{Tool, ToolCall, WEB_SEARCH_TOOL};
