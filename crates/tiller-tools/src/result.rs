use serde::{Deserialize, Serialize};

use crate::content::ToolContent;

/// A proposed or applied file change, kept for human-facing rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
    pub file_diff: String,
    pub file_name: String,
    pub original_content: Option<String>,
    pub new_content: String,
}

/// Human-renderable summary of a tool call's result.
///
/// Preserved on terminal snapshots even when the call was cancelled, so a
/// cancelled edit still shows the diff it would have applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ResultDisplay {
    Markdown(String),
    Diff(FileDiff),
}

/// What a tool execution hands back to the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub llm_content: ToolContent,
    pub display: Option<ResultDisplay>,
}

impl ToolResult {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            llm_content: ToolContent::Text(content.into()),
            display: None,
        }
    }

    pub fn with_display(mut self, display: ResultDisplay) -> Self {
        self.display = Some(display);
        self
    }
}

impl From<ToolContent> for ToolResult {
    fn from(llm_content: ToolContent) -> Self {
        Self {
            llm_content,
            display: None,
        }
    }
}
