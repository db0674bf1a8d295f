//! CLI configuration from environment variables

use std::path::PathBuf;

/// Settings for the terminal front-end
#[derive(Clone, Debug)]
pub struct CliConfig {
    /// Model identifier sent with every completion request
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Path of the system prompt file
    pub system_prompt_path: PathBuf,

    /// Path of the notes tool's store
    pub notes_path: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            model: "qwen3:4b".into(),
            temperature: 0.4,
            system_prompt_path: PathBuf::from("prompts/system.md"),
            notes_path: PathBuf::from("agent_notes.json"),
        }
    }
}

impl CliConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model: std::env::var("AGENT_MODEL").unwrap_or(defaults.model),
            temperature: std::env::var("AGENT_TEMPERATURE")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.temperature),
            system_prompt_path: std::env::var("AGENT_SYSTEM_PROMPT")
                .map_or(defaults.system_prompt_path, PathBuf::from),
            notes_path: std::env::var("AGENT_NOTES_FILE")
                .map_or(defaults.notes_path, PathBuf::from),
        }
    }
}
