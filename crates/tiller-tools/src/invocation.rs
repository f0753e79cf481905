use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::confirmation::ConfirmationRequest;
use crate::error::ToolError;
use crate::result::ToolResult;
use crate::schema::InputSchema;

/// Coarse classification of what a tool does.
///
/// The scheduler only branches on `Edit` (auto-edit approval mode) and
/// `Execute` (shell allowlist semantics); the rest exist for hosts that
/// group or filter tools by behavior.
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
pub enum ToolKind {
    Read,
    Edit,
    Delete,
    Move,
    Search,
    Execute,
    Think,
    Fetch,
    Other,
}

/// One chunk of streamed output from an executing tool.
#[derive(Debug, Clone)]
pub struct LiveOutputChunk {
    pub call_id: String,
    pub chunk: String,
}

/// Sender half of the live-output pipe handed to `ToolInvocation::execute`.
///
/// Sends are best-effort; a dropped receiver means nobody is watching.
#[derive(Debug, Clone)]
pub struct LiveOutput {
    call_id: String,
    tx: mpsc::UnboundedSender<LiveOutputChunk>,
}

impl LiveOutput {
    pub fn new(call_id: impl Into<String>, tx: mpsc::UnboundedSender<LiveOutputChunk>) -> Self {
        Self {
            call_id: call_id.into(),
            tx,
        }
    }

    pub fn send(&self, chunk: impl Into<String>) {
        let _ = self.tx.send(LiveOutputChunk {
            call_id: self.call_id.clone(),
            chunk: chunk.into(),
        });
    }
}

/// A tool invocation bound to one set of validated arguments.
#[async_trait]
pub trait ToolInvocation: Send + Sync {
    /// The arguments this invocation was built from.
    fn params(&self) -> &Value;

    /// One-line description of what this invocation will do.
    fn description(&self) -> String;

    /// Ask whether the user must confirm before execution.
    ///
    /// `None` means no confirmation is needed. Implementations must observe
    /// the token: the scheduler treats an error with a fired token as a
    /// cancellation, not a failure.
    async fn should_confirm(
        &self,
        token: &CancellationToken,
    ) -> Result<Option<ConfirmationRequest>, ToolError>;

    /// Run the tool. `live` streams incremental output when the host wants it.
    async fn execute(
        &self,
        token: CancellationToken,
        live: Option<LiveOutput>,
    ) -> Result<ToolResult, ToolError>;
}

/// A registered tool: static metadata plus an invocation factory.
pub trait DeclarativeTool: Send + Sync {
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    fn description(&self) -> &str;

    fn kind(&self) -> ToolKind;

    fn input_schema(&self) -> InputSchema;

    /// Validate `args` and bind them into an invocation.
    fn build_invocation(&self, args: Value) -> Result<Arc<dyn ToolInvocation>, ToolError>;

    /// Tools whose proposed changes can be rewritten in an external editor
    /// return themselves here.
    fn as_modifiable(&self) -> Option<&dyn ModifiableTool> {
        None
    }
}

/// Seam for rewriting a tool's proposed content before approval.
#[async_trait]
pub trait ModifiableTool: Send + Sync {
    /// The file the proposal applies to, when there is one.
    fn file_path(&self, args: &Value) -> Option<PathBuf>;

    async fn current_content(&self, args: &Value) -> Result<String, ToolError>;

    async fn proposed_content(&self, args: &Value) -> Result<String, ToolError>;

    /// Rebuild the argument object around user-edited content.
    fn updated_args(&self, old_content: &str, new_content: &str, args: &Value) -> Value;
}
