use anyhow::Result;
use async_stream::try_stream;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::errors::{ToolError, ToolResult};
use crate::models::{Message, Tool, ToolCall, WEB_SEARCH_TOOL};
use crate::providers::base::Provider;
use crate::toolsets::Toolset;

/// Runs a question against the agent service, dispatching the tool calls it
/// asks for until it produces a final answer.
pub struct Agent {
    provider: Box<dyn Provider>,
    toolsets: Vec<Box<dyn Toolset>>,
    instructions: String,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>, instructions: impl Into<String>) -> Self {
        Self {
            provider,
            toolsets: Vec::new(),
            instructions: instructions.into(),
        }
    }

    /// Add a toolset to the agent
    pub fn add_toolset(&mut self, toolset: Box<dyn Toolset>) {
        self.toolsets.push(toolset);
    }

    /// The full capability table declared to the service: web search always,
    /// plus every registered toolset's tools.
    fn declared_tools(&self) -> Vec<Tool> {
        let mut tools = vec![Tool::web_search()];
        for toolset in &self.toolsets {
            tools.extend(toolset.tools().iter().cloned());
        }
        tools
    }

    fn system_prompt(&self) -> String {
        let mut prompt = self.instructions.clone();
        for toolset in &self.toolsets {
            prompt.push_str("\n\n");
            prompt.push_str(toolset.instructions());
        }
        prompt
    }

    fn toolset_for(&self, tool_name: &str) -> Option<&dyn Toolset> {
        self.toolsets
            .iter()
            .find(|toolset| toolset.tools().iter().any(|tool| tool.name == tool_name))
            .map(|boxed| &**boxed)
    }

    /// Dispatch a single tool call. The outcome, error or not, goes back to
    /// the service as a tool response; only the service can decide what to
    /// do about a failed call.
    async fn dispatch(&self, call: ToolResult<ToolCall>) -> ToolResult<Value> {
        let call = call?;
        if call.name == WEB_SEARCH_TOOL {
            // Hosted capability; the service runs it upstream and should
            // never ask us to.
            return Err(ToolError::ExecutionError(
                "web_search is executed by the agent service".to_string(),
            ));
        }
        let toolset = self
            .toolset_for(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        toolset.call(call).await
    }

    /// Run the question to completion and return the final answer text.
    ///
    /// Provider failures propagate untouched; tool failures do not, they are
    /// sent back to the service as data.
    pub async fn run(&self, question: &str) -> Result<String> {
        let system = self.system_prompt();
        let tools = self.declared_tools();
        let mut messages = vec![Message::user().with_text(question)];

        loop {
            let reply = self.provider.complete(&system, &messages, &tools).await?;
            let requests = reply.tool_requests();
            messages.push(reply.clone());

            if requests.is_empty() {
                return Ok(reply.text());
            }

            let mut response = Message::user();
            for request in requests {
                let result = self.dispatch(request.call).await;
                response = response.with_tool_response(request.id, result);
            }
            messages.push(response);
        }
    }

    /// Streaming variant of [`Agent::run`]: a finite, non-restartable
    /// sequence of text fragments, one per assistant turn, ending when the
    /// run completes.
    pub fn run_streamed<'a>(&'a self, question: &str) -> BoxStream<'a, Result<String>> {
        let question = question.to_string();
        Box::pin(try_stream! {
            let system = self.system_prompt();
            let tools = self.declared_tools();
            let mut messages = vec![Message::user().with_text(&question)];

            loop {
                let reply = self.provider.complete(&system, &messages, &tools).await?;
                let requests = reply.tool_requests();
                let text = reply.text();
                messages.push(reply);

                if !text.is_empty() {
                    yield text;
                }
                if requests.is_empty() {
                    break;
                }

                let mut response = Message::user();
                for request in requests {
                    let result = self.dispatch(request.call).await;
                    response = response.with_tool_response(request.id, result);
                }
                messages.push(response);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;
    use async_trait::async_trait;
    use futures::StreamExt;
    use serde_json::json;

    struct EchoToolset {
        tools: Vec<Tool>,
    }

    impl EchoToolset {
        fn new() -> Self {
            Self {
                tools: vec![Tool::new(
                    "echo",
                    "Echo the arguments back",
                    json!({"type": "object", "properties": {}}),
                )],
            }
        }
    }

    #[async_trait]
    impl Toolset for EchoToolset {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes"
        }

        fn instructions(&self) -> &str {
            "Use echo to repeat things."
        }

        fn tools(&self) -> &[Tool] {
            &self.tools
        }

        async fn call(&self, tool_call: ToolCall) -> ToolResult<Value> {
            match tool_call.name.as_str() {
                "echo" => Ok(tool_call.arguments),
                _ => Err(ToolError::NotFound(tool_call.name)),
            }
        }
    }

    fn agent_with(responses: Vec<Message>) -> Agent {
        let mut agent = Agent::new(Box::new(MockProvider::new(responses)), "Be helpful.");
        agent.add_toolset(Box::new(EchoToolset::new()));
        agent
    }

    #[tokio::test]
    async fn test_run_returns_final_text() {
        let agent = agent_with(vec![Message::assistant().with_text("All done.")]);
        let answer = agent.run("hi").await.unwrap();
        assert_eq!(answer, "All done.");
    }

    #[tokio::test]
    async fn test_run_dispatches_tool_calls_until_final_answer() {
        let agent = agent_with(vec![
            Message::assistant().with_tool_request(
                "call_1",
                Ok(ToolCall::new("echo", json!({"word": "ping"}))),
            ),
            Message::assistant().with_text("It said ping."),
        ]);
        let answer = agent.run("what does it say?").await.unwrap();
        assert_eq!(answer, "It said ping.");
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_response_and_run_continues() {
        let agent = agent_with(vec![
            Message::assistant()
                .with_tool_request("call_1", Ok(ToolCall::new("missing", json!({})))),
            Message::assistant().with_text("Recovered."),
        ]);
        let answer = agent.run("hi").await.unwrap();
        assert_eq!(answer, "Recovered.");
    }

    #[tokio::test]
    async fn test_run_streamed_yields_each_turn() {
        let agent = agent_with(vec![
            Message::assistant()
                .with_text("Checking.")
                .with_tool_request("call_1", Ok(ToolCall::new("echo", json!({})))),
            Message::assistant().with_text("Done."),
        ]);

        let fragments: Vec<String> = agent
            .run_streamed("hi")
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(fragments, vec!["Checking.".to_string(), "Done.".to_string()]);
    }

    #[tokio::test]
    async fn test_declared_tools_always_include_web_search() {
        let agent = agent_with(vec![]);
        let names: Vec<String> = agent
            .declared_tools()
            .into_iter()
            .map(|tool| tool.name)
            .collect();
        assert_eq!(names, vec!["web_search".to_string(), "echo".to_string()]);
    }
}
