//! LLM Provider Abstraction
//!
//! Defines the interface the orchestrator uses to talk to a completion
//! endpoint, plus the wire-shaped tool descriptor the endpoint expects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::{ToolCallRequest, ToolSchema};

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "qwen3:4b", "gpt-4o-mini")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.4
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "qwen3:4b".into(),
            temperature: default_temperature(),
        }
    }
}

/// Tool descriptor in the shape the completion wire protocol expects:
/// `{"type": "function", "function": {name, description, parameters}}`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSpec,
}

/// The `function` member of a tool descriptor
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl From<&ToolSchema> for ToolDescriptor {
    fn from(schema: &ToolSchema) -> Self {
        Self {
            kind: "function".into(),
            function: FunctionSpec {
                name: schema.name.clone(),
                description: schema.description.clone(),
                parameters: schema.json_schema(),
            },
        }
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug)]
pub struct Completion {
    /// The generated text (possibly empty)
    pub content: String,

    /// Tool-call requests, in the order the model produced them
    pub tool_calls: Vec<ToolCallRequest>,

    /// Token usage statistics (if reported)
    pub usage: Option<TokenUsage>,
}

impl Completion {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Interface to a completion endpoint
///
/// One call per request; no retry policy lives here — the caller decides
/// what a failure means for the turn.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for the message sequence.
    ///
    /// When `tools` is given, the endpoint is offered the descriptors with
    /// a tool-choice policy of "auto"; when absent, no tool use is offered.
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
        tools: Option<&[ToolDescriptor]>,
    ) -> Result<Completion>;
}
