use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ToolResult;
use crate::models::tool::ToolCall;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A tool call the agent service asked us to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub id: String,
    pub call: ToolResult<ToolCall>,
}

/// The outcome of a dispatched tool call, sent back to the agent service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub id: String,
    pub result: ToolResult<Value>,
}

/// Content passed inside a message, either plain text or tool traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageContent {
    Text(String),
    ToolRequest(ToolRequest),
    ToolResponse(ToolResponse),
}

impl MessageContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessageContent::Text(text.into())
    }

    pub fn tool_request<S: Into<String>>(id: S, call: ToolResult<ToolCall>) -> Self {
        MessageContent::ToolRequest(ToolRequest {
            id: id.into(),
            call,
        })
    }

    pub fn tool_response<S: Into<String>>(id: S, result: ToolResult<Value>) -> Self {
        MessageContent::ToolResponse(ToolResponse {
            id: id.into(),
            result,
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_tool_request(&self) -> Option<&ToolRequest> {
        match self {
            MessageContent::ToolRequest(request) => Some(request),
            _ => None,
        }
    }
}

/// A message to or from the agent service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: Vec<MessageContent>,
}

impl Message {
    fn new(role: Role) -> Self {
        Self {
            role,
            created: Utc::now().timestamp(),
            content: Vec::new(),
        }
    }

    pub fn user() -> Self {
        Self::new(Role::User)
    }

    pub fn assistant() -> Self {
        Self::new(Role::Assistant)
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.content.push(MessageContent::text(text));
        self
    }

    pub fn with_tool_request<S: Into<String>>(mut self, id: S, call: ToolResult<ToolCall>) -> Self {
        self.content.push(MessageContent::tool_request(id, call));
        self
    }

    pub fn with_tool_response<S: Into<String>>(mut self, id: S, result: ToolResult<Value>) -> Self {
        self.content.push(MessageContent::tool_response(id, result));
        self
    }

    /// All text content of this message, joined with newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(MessageContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The tool calls requested by this message, if any.
    pub fn tool_requests(&self) -> Vec<ToolRequest> {
        self.content
            .iter()
            .filter_map(MessageContent::as_tool_request)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_builders() {
        let message = Message::assistant()
            .with_text("Looking that up.")
            .with_tool_request("call_1", Ok(ToolCall::new("list_tables", json!({}))));

        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text(), "Looking that up.");
        assert_eq!(message.tool_requests().len(), 1);
        assert_eq!(
            message.tool_requests()[0].call.as_ref().unwrap().name,
            "list_tables"
        );
    }

    #[test]
    fn test_text_joins_multiple_fragments() {
        let message = Message::assistant().with_text("one").with_text("two");
        assert_eq!(message.text(), "one\ntwo");
    }

    #[test]
    fn test_message_serialization_round_trip() {
        let message = Message::user().with_tool_response("call_1", Ok(json!(["a", "b"])));
        let serialized = serde_json::to_string(&message).unwrap();
        let deserialized: Message = serde_json::from_str(&serialized).unwrap();
        assert_eq!(message, deserialized);
    }
}
