//! OpenAI-Compatible Chat Completions Provider
//!
//! Implementation of `LlmProvider` against any endpoint speaking the
//! OpenAI `/chat/completions` protocol (Ollama's `/v1`, vLLM, the OpenAI
//! API itself). One blocking-with-timeout request per completion; no retry.

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{Completion, GenerationOptions, LlmProvider, TokenUsage, ToolDescriptor},
    tool::ToolCallRequest,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How much of an error body to keep in the error value
const ERROR_BODY_LIMIT: usize = 1000;

/// Provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Base URL of the endpoint, without the `/chat/completions` suffix
    pub base_url: String,

    /// Bearer credential; omitted from requests when absent
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".into(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl OpenAiConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("AGENT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:11434/v1".into())
            .trim_end_matches('/')
            .to_string();
        let api_key = std::env::var("AGENT_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        Self {
            base_url,
            api_key,
            ..Default::default()
        }
    }
}

/// OpenAI-compatible chat completions provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OpenAiConfig::from_env())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
        tools: Option<&[ToolDescriptor]>,
    ) -> Result<Completion> {
        let request = ChatRequest {
            model: options.model.clone(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: options.temperature,
            tools: tools.map(<[ToolDescriptor]>::to_vec),
            tool_choice: tools.map(|_| "auto".to_string()),
        };

        tracing::debug!(
            endpoint = %self.endpoint(),
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "sending chat completion request"
        );

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Timeout(self.config.timeout_secs)
            } else {
                AgentError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("response contained no choices".into()))?;

        Ok(parse_completion(choice.message, body.usage))
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        text.to_string()
    } else {
        let mut end = limit;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text[..end].to_string()
    }
}

fn parse_completion(message: ChoiceMessage, usage: Option<TokenUsage>) -> Completion {
    let tool_calls = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCallRequest {
            // The wire may omit ids; generate one so the assistant record
            // and the tool-result message always agree.
            id: tc
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: tc.function.name,
            arguments: tc.function.arguments,
        })
        .collect();

    Completion {
        content: message.content.unwrap_or_default(),
        tool_calls,
        usage,
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.to_string(),
            content: message.content.clone(),
            name: message.name.clone(),
            tool_calls: message.tool_calls.as_ref().map(|calls| {
                calls
                    .iter()
                    .map(|c| WireToolCall {
                        id: Some(c.id.clone()),
                        kind: "function".into(),
                        function: WireFunction {
                            name: c.name.clone(),
                            arguments: c.arguments.clone(),
                        },
                    })
                    .collect()
            }),
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

fn function_kind() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::message::Message;

    #[test]
    fn test_config_defaults() {
        let config = OpenAiConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.timeout_secs, 60);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_request_omits_tools_when_absent() {
        let request = ChatRequest {
            model: "m".into(),
            messages: vec![ChatMessage::from(&Message::user("hi"))],
            temperature: 0.4,
            tools: None,
            tool_choice: None,
        };

        let wire = serde_json::to_value(&request).unwrap();
        assert!(wire.get("tools").is_none());
        assert!(wire.get("tool_choice").is_none());
        assert_eq!(wire["messages"][0]["role"], "user");
        assert_eq!(wire["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_message_conversion_carries_tool_fields() {
        let assistant = Message::assistant("").with_tool_calls(vec![ToolCallRequest {
            id: "c1".into(),
            name: "calculate".into(),
            arguments: r#"{"expression": "2+2"}"#.into(),
        }]);
        let wire = serde_json::to_value(ChatMessage::from(&assistant)).unwrap();

        assert_eq!(wire["role"], "assistant");
        assert_eq!(wire["tool_calls"][0]["id"], "c1");
        assert_eq!(wire["tool_calls"][0]["type"], "function");
        assert_eq!(wire["tool_calls"][0]["function"]["name"], "calculate");

        let tool = Message::tool("4", "c1", "calculate");
        let wire = serde_json::to_value(ChatMessage::from(&tool)).unwrap();

        assert_eq!(wire["role"], "tool");
        assert_eq!(wire["tool_call_id"], "c1");
        assert_eq!(wire["name"], "calculate");
        assert_eq!(wire["content"], "4");
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [
                        {"id": "call_abc", "type": "function",
                         "function": {"name": "notes", "arguments": "{\"action\": \"list\"}"}}
                    ]
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;

        let body: ChatResponse = serde_json::from_str(raw).unwrap();
        let choice = body.choices.into_iter().next().unwrap();
        let completion = parse_completion(choice.message, body.usage);

        assert_eq!(completion.content, "");
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].id, "call_abc");
        assert_eq!(completion.tool_calls[0].name, "notes");
        assert_eq!(completion.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_parse_generates_id_when_wire_omits_it() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "tool_calls": [
                        {"function": {"name": "calculate", "arguments": "{}"}}
                    ]
                }
            }]
        }"#;

        let body: ChatResponse = serde_json::from_str(raw).unwrap();
        let choice = body.choices.into_iter().next().unwrap();
        let completion = parse_completion(choice.message, None);

        assert!(!completion.tool_calls[0].id.is_empty());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "aé".repeat(600);
        let cut = truncate(&text, ERROR_BODY_LIMIT);
        assert!(cut.len() <= ERROR_BODY_LIMIT);
        assert!(text.starts_with(&cut));
    }
}
