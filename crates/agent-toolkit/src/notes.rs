//! Notes Tool
//!
//! Stores and lists short text notes in a JSON array on disk. Each `add`
//! reads the whole array, appends, and rewrites the file; the caller is
//! single-threaded, so read-modify-write is safe here.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::json;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema,
};

/// Shown by `list` when the store is empty
const NO_NOTES: &str = "(no notes yet)";

/// Tool for storing and listing persistent notes
pub struct NotesTool {
    path: PathBuf,
}

impl NotesTool {
    /// Create a notes tool backed by the given store path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store path
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<String>, String> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| format!("Error: could not read notes store: {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(format!("Error: could not read notes store: {e}")),
        }
    }

    async fn save(&self, notes: &[String]) -> Result<(), String> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Error: could not write notes store: {e}"))?;
        }

        let body = serde_json::to_string_pretty(notes)
            .map_err(|e| format!("Error: could not write notes store: {e}"))?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| format!("Error: could not write notes store: {e}"))?;

        tracing::debug!(path = %self.path.display(), count = notes.len(), "notes store written");
        Ok(())
    }

    async fn add(&self, text: &str) -> Result<String, String> {
        let mut notes = self.load().await?;
        notes.push(text.to_string());
        self.save(&notes).await?;
        Ok("Note saved.".into())
    }

    async fn list(&self) -> Result<String, String> {
        let notes = self.load().await?;
        if notes.is_empty() {
            return Ok(NO_NOTES.into());
        }
        Ok(notes
            .iter()
            .map(|n| format!("- {n}"))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[async_trait]
impl Tool for NotesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "notes".into(),
            description: "Stores or lists notes. Use action='add' with text, or action='list'."
                .into(),
            parameters: vec![
                ParameterSchema {
                    name: "action".into(),
                    param_type: "string".into(),
                    description: "What to do with the notes store".into(),
                    required: true,
                    enum_values: Some(vec![json!("add"), json!("list")]),
                },
                ParameterSchema {
                    name: "text".into(),
                    param_type: "string".into(),
                    description: "Note text (when action='add')".into(),
                    required: false,
                    enum_values: None,
                },
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        // Anything that is not an explicit "add" falls back to listing.
        let outcome = if call.str_arg("action") == Some("add") {
            match call.str_arg("text") {
                Some(text) => self.add(text).await,
                None => Err("Error: missing 'text' to add a note.".into()),
            }
        } else {
            self.list().await
        };

        Ok(match outcome {
            Ok(output) => ToolResult::success("notes", output),
            Err(error) => ToolResult::failure("notes", error),
        })
    }
}
