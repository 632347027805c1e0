use anyhow::Result;

use crate::errors::{AgentError, AgentResult};
use crate::models::conversation::Conversation;
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::ToolResult;
use crate::providers::base::{CompletionOptions, Provider};
use crate::transport::ToolTransport;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Returned in place of an answer when the model keeps requesting tools
pub const MAX_ITERATIONS_MESSAGE: &str =
    "Error: Maximum iterations reached without getting a final answer.";

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The model answered without requesting tools
    Final(Option<String>),
    /// The iteration budget ran out first
    IterationLimit,
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Final(content) => content.as_deref().unwrap_or_default(),
            Reply::IterationLimit => MAX_ITERATIONS_MESSAGE,
        }
    }
}

#[derive(Debug)]
enum AgentState {
    AwaitingModel,
    ExecutingTools(Vec<ToolRequest>),
    Done(Option<String>),
    Aborted,
}

/// Agent drives a model through tool calls until it produces an answer
pub struct Agent {
    provider: Box<dyn Provider>,
    transport: Box<dyn ToolTransport>,
    max_iterations: usize,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>, transport: Box<dyn ToolTransport>) -> Self {
        Self {
            provider,
            transport,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Cap the number of model queries per run
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn transport(&self) -> &dyn ToolTransport {
        self.transport.as_ref()
    }

    /// Run the conversation until the model gives a final answer.
    ///
    /// Every message produced along the way, including the final assistant message, is
    /// appended to `conversation`. Tool failures are reported back to the model as tool
    /// messages; provider and transport failures end the run with an error.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<Reply> {
        let tools = self.transport.tools();
        let options = CompletionOptions::default();
        let mut iterations = 0;
        let mut state = AgentState::AwaitingModel;

        loop {
            tracing::debug!(?state, iterations, "agent state");
            state = match state {
                AgentState::AwaitingModel => {
                    iterations += 1;
                    if iterations > self.max_iterations {
                        AgentState::Aborted
                    } else {
                        let (response, usage) = self
                            .provider
                            .complete(conversation.messages(), tools, &options)
                            .await?;
                        tracing::debug!(
                            input_tokens = ?usage.input_tokens,
                            output_tokens = ?usage.output_tokens,
                            "model responded"
                        );

                        if response.has_tool_requests() {
                            let requests = response.tool_calls.clone();
                            conversation.push(response);
                            AgentState::ExecutingTools(requests)
                        } else {
                            let content = response.content.clone();
                            conversation.push(response);
                            AgentState::Done(content)
                        }
                    }
                }
                AgentState::ExecutingTools(requests) => {
                    for request in &requests {
                        let payload = match self.dispatch(request).await {
                            Ok(payload) => payload,
                            Err(e) if e.is_localized() => {
                                tracing::warn!(tool = %request.name, "tool call failed: {}", e);
                                format!("Error: {}", e)
                            }
                            Err(e) => return Err(e.into()),
                        };
                        conversation.push(Message::tool_result(
                            request,
                            ToolResult::new(&request.id, payload),
                        ));
                    }
                    AgentState::AwaitingModel
                }
                AgentState::Done(content) => return Ok(Reply::Final(content)),
                AgentState::Aborted => {
                    tracing::warn!(
                        max_iterations = self.max_iterations,
                        "no final answer within the iteration limit"
                    );
                    return Ok(Reply::IterationLimit);
                }
            };
        }
    }

    /// Blocking variant of `run` for callers outside an async runtime
    pub fn run_blocking(&self, conversation: &mut Conversation) -> Result<Reply> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(conversation))
    }

    async fn dispatch(&self, request: &ToolRequest) -> AgentResult<String> {
        let tool_call = request.tool_call()?;
        if self.transport.get_tool(&tool_call.name).is_none() {
            return Err(AgentError::ToolNotFound(tool_call.name));
        }

        tracing::info!(tool = %tool_call.name, id = %request.id, "executing tool");
        self.transport.execute(tool_call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;
    use crate::models::tool::{Tool, ToolCall};
    use crate::providers::base::ToolChoice;
    use crate::providers::mock::MockProvider;
    use crate::registry::ToolRegistry;
    use crate::transport::LocalTransport;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn echo_transport() -> Box<dyn ToolTransport> {
        let registry = ToolRegistry::new()
            .with_tool(
                Tool::new(
                    "echo",
                    "Echoes back the input",
                    json!({"type": "object", "properties": {"message": {"type": "string"}}, "required": ["message"]}),
                ),
                |args: &Value| match args["message"].as_str() {
                    Some(message) => Ok(json!(message)),
                    None => Err(AgentError::InvalidParameters("message is required".into())),
                },
            )
            .unwrap();
        Box::new(LocalTransport::new(Arc::new(registry)))
    }

    fn echo_request(id: &str, message: &str) -> ToolRequest {
        ToolRequest::new(id, "echo", json!({ "message": message }).to_string())
    }

    fn conversation() -> Conversation {
        Conversation::new(vec![
            Message::system("You are a helpful AI assistant."),
            Message::user().with_text("Hi"),
        ])
    }

    #[tokio::test]
    async fn test_simple_response() -> Result<()> {
        let provider = MockProvider::new(vec![Message::assistant().with_text("Hello!")]);
        let agent = Agent::new(Box::new(provider), echo_transport());

        let mut conversation = conversation();
        let reply = agent.run(&mut conversation).await?;

        assert_eq!(reply, Reply::Final(Some("Hello!".to_string())));
        assert_eq!(reply.text(), "Hello!");
        assert_eq!(conversation.len(), 3);
        assert_eq!(
            conversation.last(),
            Some(&Message::assistant().with_text("Hello!"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_final_answer_without_content() -> Result<()> {
        let provider = MockProvider::new(vec![Message::assistant()]);
        let agent = Agent::new(Box::new(provider), echo_transport());

        let mut conversation = conversation();
        let reply = agent.run(&mut conversation).await?;

        assert_eq!(reply, Reply::Final(None));
        assert_eq!(reply.text(), "");
        assert_eq!(conversation.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_calls_answered_in_order() -> Result<()> {
        let provider = MockProvider::new(vec![
            Message::assistant()
                .with_tool_request(echo_request("1", "first"))
                .with_tool_request(echo_request("2", "second")),
            Message::assistant().with_text("Done!"),
        ]);
        let requests = provider.requests();
        let offers = provider.offers();
        let agent = Agent::new(Box::new(provider), echo_transport());

        let mut conversation = conversation();
        let reply = agent.run(&mut conversation).await?;
        assert_eq!(reply.text(), "Done!");

        let messages = conversation.messages();
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[3], Message::tool("1", "echo").with_text("\"first\""));
        assert_eq!(messages[4], Message::tool("2", "echo").with_text("\"second\""));
        conversation.validate()?;

        // The second query sees the assistant turn and both tool messages
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].len(), 5);

        let offers = offers.lock().unwrap();
        assert_eq!(offers.len(), 2);
        for (tools, options) in offers.iter() {
            let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
            assert_eq!(names, vec!["echo"]);
            assert_eq!(options.tool_choice, ToolChoice::Auto);
            assert!(!options.parallel_tool_calls);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_iteration_limit() -> Result<()> {
        let responses = (0..20)
            .map(|i| Message::assistant().with_tool_request(echo_request(&i.to_string(), "again")))
            .collect();
        let provider = MockProvider::new(responses);
        let requests = provider.requests();
        let agent = Agent::new(Box::new(provider), echo_transport()).with_max_iterations(3);

        let mut conversation = conversation();
        let reply = agent.run(&mut conversation).await?;

        assert_eq!(reply, Reply::IterationLimit);
        assert_eq!(reply.text(), MAX_ITERATIONS_MESSAGE);
        assert_eq!(requests.lock().unwrap().len(), 3);
        // Three assistant turns, each answered by one tool message
        assert_eq!(conversation.len(), 2 + 3 * 2);
        conversation.validate()?;
        Ok(())
    }

    #[tokio::test]
    async fn test_default_iteration_limit() -> Result<()> {
        let responses = (0..DEFAULT_MAX_ITERATIONS + 5)
            .map(|i| Message::assistant().with_tool_request(echo_request(&i.to_string(), "again")))
            .collect();
        let provider = MockProvider::new(responses);
        let requests = provider.requests();
        let agent = Agent::new(Box::new(provider), echo_transport());

        let reply = agent.run(&mut conversation()).await?;

        assert_eq!(reply, Reply::IterationLimit);
        assert_eq!(requests.lock().unwrap().len(), DEFAULT_MAX_ITERATIONS);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_arguments_reported_to_model() -> Result<()> {
        let provider = MockProvider::new(vec![
            Message::assistant().with_tool_request(ToolRequest::new("1", "echo", "{not json")),
            Message::assistant().with_text("Sorry"),
        ]);
        let agent = Agent::new(Box::new(provider), echo_transport());

        let mut conversation = conversation();
        let reply = agent.run(&mut conversation).await?;
        assert_eq!(reply.text(), "Sorry");

        let tool_message = &conversation.messages()[3];
        assert_eq!(tool_message.role, Role::Tool);
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("1"));
        assert!(tool_message
            .text()
            .unwrap()
            .starts_with("Error: Invalid parameters: Could not interpret tool use parameters"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_to_model() -> Result<()> {
        let provider = MockProvider::new(vec![
            Message::assistant().with_tool_request(ToolRequest::new("1", "missing", "{}")),
            Message::assistant().with_text("Done"),
        ]);
        let agent = Agent::new(Box::new(provider), echo_transport());

        let mut conversation = conversation();
        agent.run(&mut conversation).await?;

        assert_eq!(
            conversation.messages()[3],
            Message::tool("1", "missing").with_text("Error: Tool not found: missing")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_failure_reported_to_model() -> Result<()> {
        let provider = MockProvider::new(vec![
            Message::assistant().with_tool_request(ToolRequest::new("1", "echo", "{}")),
            Message::assistant().with_text("Done"),
        ]);
        let agent = Agent::new(Box::new(provider), echo_transport());

        let mut conversation = conversation();
        agent.run(&mut conversation).await?;

        assert_eq!(
            conversation.messages()[3].text(),
            Some("Error: Invalid parameters: message is required")
        );
        Ok(())
    }

    struct BrokenTransport {
        tools: Vec<Tool>,
    }

    #[async_trait]
    impl ToolTransport for BrokenTransport {
        fn tools(&self) -> &[Tool] {
            &self.tools
        }

        async fn execute(&self, _tool_call: ToolCall) -> AgentResult<String> {
            Err(AgentError::Transport("tool server closed the connection".into()))
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal() {
        let provider = MockProvider::new(vec![
            Message::assistant().with_tool_request(echo_request("1", "hi")),
            Message::assistant().with_text("unreachable"),
        ]);
        let transport = BrokenTransport {
            tools: vec![Tool::undescribed("echo", json!({"type": "object"}))],
        };
        let agent = Agent::new(Box::new(provider), Box::new(transport));

        let mut conversation = conversation();
        let error = agent.run(&mut conversation).await.unwrap_err();

        assert_eq!(
            error.downcast_ref::<AgentError>(),
            Some(&AgentError::Transport("tool server closed the connection".into()))
        );
        // The assistant turn is kept; no tool message was produced for it
        assert_eq!(conversation.len(), 3);
    }

    #[test]
    fn test_run_blocking() -> Result<()> {
        let provider = MockProvider::new(vec![
            Message::assistant().with_tool_request(echo_request("1", "sync")),
            Message::assistant().with_text("Finished"),
        ]);
        let agent = Agent::new(Box::new(provider), echo_transport());

        let mut conversation = conversation();
        let reply = agent.run_blocking(&mut conversation)?;

        assert_eq!(reply.text(), "Finished");
        assert_eq!(conversation.messages()[3].text(), Some("\"sync\""));
        Ok(())
    }
}
