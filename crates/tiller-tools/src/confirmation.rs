use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What an invocation wants the user to look at before it runs.
///
/// Produced by `ToolInvocation::should_confirm`; the scheduler surfaces it on
/// the `AwaitingApproval` snapshot and waits for the host to answer with a
/// `ConfirmationOutcome`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfirmationRequest {
    Edit {
        title: String,
        file_name: String,
        file_path: PathBuf,
        file_diff: String,
        original_content: Option<String>,
        new_content: String,
        /// Set while an external editor session is rewriting the proposal.
        #[serde(default)]
        is_modifying: bool,
    },
    Exec {
        title: String,
        command: String,
        root_command: String,
    },
    Mcp {
        title: String,
        server_name: String,
        tool_name: String,
        tool_display_name: String,
    },
    Info {
        title: String,
        prompt: String,
        #[serde(default)]
        urls: Vec<String>,
    },
}

impl ConfirmationRequest {
    pub fn title(&self) -> &str {
        match self {
            ConfirmationRequest::Edit { title, .. }
            | ConfirmationRequest::Exec { title, .. }
            | ConfirmationRequest::Mcp { title, .. }
            | ConfirmationRequest::Info { title, .. } => title,
        }
    }
}

/// The user's answer to a confirmation prompt.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfirmationOutcome {
    ProceedOnce,
    ProceedAlways,
    ProceedAlwaysServer,
    ProceedAlwaysTool,
    ModifyWithEditor,
    Cancel,
}

impl ConfirmationOutcome {
    /// True for every outcome that lets the call go on to execute.
    pub fn proceeds(self) -> bool {
        !matches!(
            self,
            ConfirmationOutcome::Cancel | ConfirmationOutcome::ModifyWithEditor
        )
    }
}

/// Optional companion of a proceed outcome carrying user-revised content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationPayload {
    pub new_content: String,
}
