use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Message, Tool};

/// A hosted completion service.
///
/// The only contract the rest of the system relies on: submit a system
/// prompt, the conversation so far and the declared tools, receive the next
/// assistant message. Whatever reasoning or hosted-tool execution happens
/// upstream is opaque.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<Message>;
}
