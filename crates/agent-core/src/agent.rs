//! Turn Orchestration
//!
//! Drives one full turn against the completion endpoint: propose,
//! optionally execute the requested tools, then finalize. The agent is the
//! sole mutator of the conversation it is handed.

use std::sync::Arc;

use crate::error::Result;
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider, ToolDescriptor};
use crate::tool::{ToolCallRequest, ToolRegistry};

/// Placeholder shown when the model returns no content and no tool calls
const EMPTY_RESPONSE: &str = "(no response)";

/// Callback invoked just before each tool dispatch, so a renderer can show
/// a running notice
pub type ToolObserver = Box<dyn Fn(&ToolCallRequest) + Send + Sync>;

/// The agent: orchestrates turns over a conversation
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    options: GenerationOptions,
    on_tool_dispatch: Option<ToolObserver>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("options", &self.options)
            .field(
                "on_tool_dispatch",
                &self.on_tool_dispatch.as_ref().map(|_| "<observer>"),
            )
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            provider,
            tools,
            options,
            on_tool_dispatch: None,
        }
    }

    /// Run one turn: append the user input, drive the two-phase protocol,
    /// and return the text to display.
    ///
    /// Endpoint failures abort the turn and propagate; everything appended
    /// up to the failure point (at minimum the user message) stays in the
    /// conversation, so the next turn picks up from a consistent state.
    pub async fn run_turn(&self, conversation: &mut Conversation, input: &str) -> Result<String> {
        conversation.push(Message::user(input));

        let descriptors: Vec<ToolDescriptor> = self.tools.descriptors();
        let offered = (!descriptors.is_empty()).then_some(descriptors.as_slice());

        let proposal = self
            .provider
            .complete(conversation.messages(), &self.options, offered)
            .await?;

        if !proposal.has_tool_calls() {
            let reply = display_text(proposal.content);
            conversation.push(Message::assistant(reply.clone()));
            return Ok(reply);
        }

        // Record the assistant message that requested the tools, then the
        // results, strictly in the order the model asked for them.
        let requests = proposal.tool_calls.clone();
        conversation.push(Message::assistant(proposal.content).with_tool_calls(requests.clone()));

        for request in &requests {
            tracing::info!(tool = %request.name, args = %request.arguments, "dispatching tool");
            if let Some(observer) = &self.on_tool_dispatch {
                observer(request);
            }

            let result = self.tools.dispatch(request).await;
            conversation.push(Message::tool(result.output, &request.id, &request.name));
        }

        // Second call for the final answer; no further tool use is offered.
        let final_completion = self
            .provider
            .complete(conversation.messages(), &self.options, None)
            .await?;

        let reply = display_text(final_completion.content);
        conversation.push(Message::assistant(reply.clone()));
        Ok(reply)
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get the generation options
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }
}

/// Substitute the placeholder for empty content so the transcript and the
/// displayed text never disagree
fn display_text(content: String) -> String {
    if content.trim().is_empty() {
        EMPTY_RESPONSE.into()
    } else {
        content
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    options: GenerationOptions,
    on_tool_dispatch: Option<ToolObserver>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            options: GenerationOptions::default(),
            on_tool_dispatch: None,
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.options.temperature = temp;
        self
    }

    /// Install a notice callback fired before every tool dispatch
    pub fn on_tool_dispatch(
        mut self,
        observer: impl Fn(&ToolCallRequest) + Send + Sync + 'static,
    ) -> Self {
        self.on_tool_dispatch = Some(Box::new(observer));
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| crate::error::AgentError::Config("provider is required".into()))?;

        let mut agent = Agent::new(provider, Arc::new(self.tools), self.options);
        agent.on_tool_dispatch = self.on_tool_dispatch;
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::message::Role;
    use crate::provider::Completion;
    use crate::tool::{ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted provider: pops pre-baked results and records whether each
    /// call offered tool descriptors.
    struct ScriptedProvider {
        script: Mutex<Vec<Result<Completion>>>,
        offered_tools: Mutex<Vec<bool>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<Completion>>) -> Self {
            Self {
                script: Mutex::new(script),
                offered_tools: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            _messages: &[Message],
            _options: &GenerationOptions,
            tools: Option<&[ToolDescriptor]>,
        ) -> Result<Completion> {
            self.offered_tools.lock().unwrap().push(tools.is_some());
            self.script.lock().unwrap().remove(0)
        }
    }

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "upper".into(),
                description: "Uppercases text".into(),
                parameters: vec![ParameterSchema {
                    name: "text".into(),
                    param_type: "string".into(),
                    description: "Text to uppercase".into(),
                    required: true,
                    enum_values: None,
                }],
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            let text = call.str_arg("text").unwrap_or_default();
            Ok(ToolResult::success("upper", text.to_uppercase()))
        }
    }

    fn completion(content: &str, tool_calls: Vec<ToolCallRequest>) -> Completion {
        Completion {
            content: content.into(),
            tool_calls,
            usage: None,
        }
    }

    fn call(id: &str, name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    fn agent_with(provider: ScriptedProvider) -> Agent {
        AgentBuilder::new()
            .provider(Arc::new(provider))
            .tool(UpperTool)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_turn_without_tool_calls() {
        let provider = ScriptedProvider::new(vec![Ok(completion("Hi there!", vec![]))]);
        let agent = agent_with(provider);
        let mut conv = Conversation::with_system_prompt("sys");

        let reply = agent.run_turn(&mut conv, "hello").await.unwrap();

        assert_eq!(reply, "Hi there!");
        // system + user + assistant, nothing else
        assert_eq!(conv.len(), 3);
        assert_eq!(conv.messages()[1].role, Role::User);
        assert_eq!(conv.messages()[2].role, Role::Assistant);
        assert_eq!(conv.messages()[2].content, "Hi there!");
    }

    #[tokio::test]
    async fn test_turn_with_tool_calls_appends_in_request_order() {
        let provider = ScriptedProvider::new(vec![
            Ok(completion(
                "",
                vec![
                    call("c1", "upper", r#"{"text": "one"}"#),
                    call("c2", "upper", r#"{"text": "two"}"#),
                    call("c3", "upper", r#"{"text": "three"}"#),
                ],
            )),
            Ok(completion("ONE TWO THREE", vec![])),
        ]);
        let agent = agent_with(provider);
        let mut conv = Conversation::with_system_prompt("sys");

        let reply = agent.run_turn(&mut conv, "shout").await.unwrap();

        assert_eq!(reply, "ONE TWO THREE");
        // system, user, assistant-with-calls, 3 tool results, final assistant
        assert_eq!(conv.len(), 7);

        let with_calls = &conv.messages()[2];
        assert_eq!(with_calls.role, Role::Assistant);
        assert_eq!(with_calls.tool_calls.as_ref().unwrap().len(), 3);

        for (i, (id, output)) in [("c1", "ONE"), ("c2", "TWO"), ("c3", "THREE")]
            .iter()
            .enumerate()
        {
            let msg = &conv.messages()[3 + i];
            assert_eq!(msg.role, Role::Tool);
            assert_eq!(msg.tool_call_id.as_deref(), Some(*id));
            assert_eq!(msg.content, *output);
        }

        assert_eq!(conv.messages()[6].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_second_call_offers_no_tools() {
        let provider = ScriptedProvider::new(vec![
            Ok(completion("", vec![call("c1", "upper", r#"{"text": "x"}"#)])),
            Ok(completion("done", vec![])),
        ]);
        let provider = Arc::new(provider);
        let agent = AgentBuilder::new()
            .provider(provider.clone())
            .tool(UpperTool)
            .build()
            .unwrap();
        let mut conv = Conversation::with_system_prompt("sys");

        agent.run_turn(&mut conv, "go").await.unwrap();

        let offered = provider.offered_tools.lock().unwrap();
        assert_eq!(*offered, vec![true, false]);
    }

    #[tokio::test]
    async fn test_unknown_tool_keeps_turn_alive() {
        let provider = ScriptedProvider::new(vec![
            Ok(completion("", vec![call("c1", "missing", "{}")])),
            Ok(completion("sorry, no such tool", vec![])),
        ]);
        let agent = agent_with(provider);
        let mut conv = Conversation::with_system_prompt("sys");

        let reply = agent.run_turn(&mut conv, "go").await.unwrap();

        assert_eq!(reply, "sorry, no such tool");
        let tool_msg = &conv.messages()[3];
        assert_eq!(tool_msg.role, Role::Tool);
        assert!(tool_msg.content.contains("unknown tool 'missing'"));
    }

    #[tokio::test]
    async fn test_transport_failure_preserves_user_message() {
        let provider = ScriptedProvider::new(vec![Err(AgentError::Transport(
            "connection refused".into(),
        ))]);
        let agent = agent_with(provider);
        let mut conv = Conversation::with_system_prompt("sys");

        let err = agent.run_turn(&mut conv, "hello").await.unwrap_err();

        assert!(matches!(err, AgentError::Transport(_)));
        // The user message stays; no assistant message was appended.
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[1].role, Role::User);
        assert_eq!(conv.messages()[1].content, "hello");
    }

    #[tokio::test]
    async fn test_empty_content_yields_placeholder() {
        let provider = ScriptedProvider::new(vec![Ok(completion("", vec![]))]);
        let agent = agent_with(provider);
        let mut conv = Conversation::with_system_prompt("sys");

        let reply = agent.run_turn(&mut conv, "hello").await.unwrap();

        assert_eq!(reply, "(no response)");
        assert_eq!(conv.last().unwrap().content, "(no response)");
    }

    #[tokio::test]
    async fn test_observer_sees_each_dispatch() {
        let provider = ScriptedProvider::new(vec![
            Ok(completion(
                "",
                vec![
                    call("c1", "upper", r#"{"text": "a"}"#),
                    call("c2", "upper", r#"{"text": "b"}"#),
                ],
            )),
            Ok(completion("ok", vec![])),
        ]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_observer = seen.clone();

        let agent = AgentBuilder::new()
            .provider(Arc::new(provider))
            .tool(UpperTool)
            .on_tool_dispatch(move |req| {
                seen_in_observer.lock().unwrap().push(req.id.clone());
            })
            .build()
            .unwrap();
        let mut conv = Conversation::with_system_prompt("sys");

        agent.run_turn(&mut conv, "go").await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["c1", "c2"]);
    }

    #[test]
    fn test_builder_requires_provider() {
        let err = AgentBuilder::new().build().unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
