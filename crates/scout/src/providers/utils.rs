use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::errors::ToolError;
use crate::models::{Message, MessageContent, Tool, ToolCall, WEB_SEARCH_TOOL};

/// Convert our message history to the OpenAI wire format.
///
/// Tool responses ride in messages with role `tool`; tool requests are
/// collected into a single assistant message with a `tool_calls` array, the
/// shape the chat completions endpoint expects back.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    // Requests the service could not express as a valid call are not echoed
    // back, and a `tool` message whose id has no preceding `tool_calls`
    // entry is rejected by the endpoint, so their responses must be
    // suppressed with them.
    let echoed: HashSet<&str> = messages
        .iter()
        .flat_map(|message| message.content.iter())
        .filter_map(|content| match content {
            MessageContent::ToolRequest(request) if request.call.is_ok() => {
                Some(request.id.as_str())
            }
            _ => None,
        })
        .collect();

    let mut result = Vec::new();
    for message in messages {
        let mut tool_calls = Vec::new();
        for content in &message.content {
            match content {
                MessageContent::Text(text) => result.push(json!({
                    "role": message.role.as_str(),
                    "content": text,
                })),
                MessageContent::ToolRequest(request) => {
                    if let Ok(call) = &request.call {
                        tool_calls.push(json!({
                            "id": request.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            }
                        }));
                    }
                }
                MessageContent::ToolResponse(response) => {
                    if !echoed.contains(response.id.as_str()) {
                        continue;
                    }
                    let content = match &response.result {
                        Ok(value) => value.to_string(),
                        Err(err) => format!("error: {err}"),
                    };
                    result.push(json!({
                        "role": "tool",
                        "tool_call_id": response.id,
                        "content": content,
                    }));
                }
            }
        }
        if !tool_calls.is_empty() {
            result.push(json!({
                "role": "assistant",
                "content": Value::Null,
                "tool_calls": tool_calls,
            }));
        }
    }
    result
}

/// Convert tool declarations to the OpenAI wire format. The web-search
/// capability maps to the service's hosted tool; everything else is a
/// function declaration.
pub fn tools_to_openai_spec(tools: &[Tool]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            if tool.name == WEB_SEARCH_TOOL {
                json!({"type": "web_search_preview"})
            } else {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.input_schema,
                    }
                })
            }
        })
        .collect()
}

/// Parse a chat completions response into an assistant message.
pub fn openai_response_to_message(response: &Value) -> Result<Message> {
    let original = response
        .pointer("/choices/0/message")
        .ok_or_else(|| anyhow!("response has no message"))?;

    let mut message = Message::assistant();

    if let Some(text) = original.get("content").and_then(Value::as_str) {
        if !text.is_empty() {
            message = message.with_text(text);
        }
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(Value::as_array) {
        for entry in tool_calls {
            let id = entry
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let name = entry
                .pointer("/function/name")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("tool call without a function name"))?;
            let arguments = entry
                .pointer("/function/arguments")
                .and_then(Value::as_str)
                .unwrap_or("{}");

            // Invalid JSON still has to appear in the history, as an error
            // the agent can read and correct.
            let call = match serde_json::from_str::<Value>(arguments) {
                Ok(params) => Ok(ToolCall::new(name, params)),
                Err(err) => Err(ToolError::InvalidParameters(format!(
                    "could not parse arguments for {name}: {err}"
                ))),
            };
            message = message.with_tool_request(id, call);
        }
    }

    Ok(message)
}
