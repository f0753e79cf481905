use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tiller_tools::{
    ConfirmationOutcome, ConfirmationRequest, DeclarativeTool, FileDiff, Part, ResultDisplay,
    ToolCallRequest, ToolInvocation,
};

use crate::error::ErrorKind;

/// Status projection of a `ToolCall`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolCallStatus {
    Validating,
    Scheduled,
    AwaitingApproval,
    Executing,
    Success,
    Error,
    Cancelled,
}

impl ToolCallStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ToolCallStatus::Success | ToolCallStatus::Error | ToolCallStatus::Cancelled
        )
    }
}

/// Fields shared by every call state.
#[derive(Clone)]
pub struct CallBase {
    pub request: ToolCallRequest,
    pub tool: Option<Arc<dyn DeclarativeTool>>,
    pub invocation: Option<Arc<dyn ToolInvocation>>,
    /// The user's answer, once one arrived.
    pub outcome: Option<ConfirmationOutcome>,
    /// Diff a pending edit would apply; survives into a cancelled snapshot.
    pub pending_diff: Option<FileDiff>,
    pub started_at: Instant,
}

impl CallBase {
    pub fn new(request: ToolCallRequest) -> Self {
        Self {
            request,
            tool: None,
            invocation: None,
            outcome: None,
            pending_diff: None,
            started_at: Instant::now(),
        }
    }
}

impl fmt::Debug for CallBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallBase")
            .field("request", &self.request)
            .field("tool", &self.tool.as_ref().map(|t| t.name().to_string()))
            .field("has_invocation", &self.invocation.is_some())
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

/// Why a call ended in `error` or `cancelled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallError {
    pub kind: ErrorKind,
    pub message: String,
}

/// The function-response payload handed back to the orchestrator for one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub call_id: String,
    pub parts: Vec<Part>,
    pub error: Option<CallError>,
    pub display: Option<ResultDisplay>,
}

impl ToolCallResponse {
    pub fn success(
        call_id: impl Into<String>,
        parts: Vec<Part>,
        display: Option<ResultDisplay>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            parts,
            error: None,
            display,
        }
    }

    pub fn error(
        tool_name: &str,
        call_id: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        let call_id = call_id.into();
        let message = message.into();
        Self {
            parts: vec![Part::function_response(
                tool_name,
                call_id.clone(),
                format!("Error: {message}"),
            )],
            error: Some(CallError {
                kind,
                message: message.clone(),
            }),
            display: Some(ResultDisplay::Markdown(message)),
            call_id,
        }
    }

    pub fn cancelled(
        tool_name: &str,
        call_id: impl Into<String>,
        reason: impl Into<String>,
        display: Option<ResultDisplay>,
    ) -> Self {
        let call_id = call_id.into();
        let reason = reason.into();
        Self {
            parts: vec![Part::function_response(
                tool_name,
                call_id.clone(),
                format!("[Operation Cancelled] Reason: {reason}"),
            )],
            error: Some(CallError {
                kind: ErrorKind::ConfirmationAborted,
                message: reason,
            }),
            display,
            call_id,
        }
    }
}

/// One tool call moving through its lifecycle.
///
/// A closed sum keyed by status: state-specific data exists only on the tag
/// it belongs to. The scheduler is the sole mutator.
#[derive(Clone)]
pub enum ToolCall {
    Validating {
        base: CallBase,
    },
    Scheduled {
        base: CallBase,
    },
    AwaitingApproval {
        base: CallBase,
        confirmation: ConfirmationRequest,
    },
    Executing {
        base: CallBase,
        live_output: Option<String>,
    },
    Success {
        base: CallBase,
        response: ToolCallResponse,
        duration: Duration,
    },
    Error {
        base: CallBase,
        response: ToolCallResponse,
        duration: Duration,
    },
    Cancelled {
        base: CallBase,
        response: ToolCallResponse,
        duration: Duration,
    },
}

impl ToolCall {
    pub fn status(&self) -> ToolCallStatus {
        match self {
            ToolCall::Validating { .. } => ToolCallStatus::Validating,
            ToolCall::Scheduled { .. } => ToolCallStatus::Scheduled,
            ToolCall::AwaitingApproval { .. } => ToolCallStatus::AwaitingApproval,
            ToolCall::Executing { .. } => ToolCallStatus::Executing,
            ToolCall::Success { .. } => ToolCallStatus::Success,
            ToolCall::Error { .. } => ToolCallStatus::Error,
            ToolCall::Cancelled { .. } => ToolCallStatus::Cancelled,
        }
    }

    pub fn base(&self) -> &CallBase {
        match self {
            ToolCall::Validating { base }
            | ToolCall::Scheduled { base }
            | ToolCall::AwaitingApproval { base, .. }
            | ToolCall::Executing { base, .. }
            | ToolCall::Success { base, .. }
            | ToolCall::Error { base, .. }
            | ToolCall::Cancelled { base, .. } => base,
        }
    }

    pub(crate) fn base_mut(&mut self) -> &mut CallBase {
        match self {
            ToolCall::Validating { base }
            | ToolCall::Scheduled { base }
            | ToolCall::AwaitingApproval { base, .. }
            | ToolCall::Executing { base, .. }
            | ToolCall::Success { base, .. }
            | ToolCall::Error { base, .. }
            | ToolCall::Cancelled { base, .. } => base,
        }
    }

    pub fn call_id(&self) -> &str {
        &self.base().request.call_id
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Confirmation details while the call awaits approval.
    pub fn confirmation(&self) -> Option<&ConfirmationRequest> {
        match self {
            ToolCall::AwaitingApproval { confirmation, .. } => Some(confirmation),
            _ => None,
        }
    }

    /// Terminal response, if the call has one.
    pub fn response(&self) -> Option<&ToolCallResponse> {
        match self {
            ToolCall::Success { response, .. }
            | ToolCall::Error { response, .. }
            | ToolCall::Cancelled { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn result_display(&self) -> Option<&ResultDisplay> {
        self.response().and_then(|response| response.display.as_ref())
    }

    /// The legal transition relation of the call lifecycle.
    pub fn permits(from: ToolCallStatus, to: ToolCallStatus) -> bool {
        use ToolCallStatus::{
            AwaitingApproval, Cancelled, Error, Executing, Scheduled, Success, Validating,
        };
        matches!(
            (from, to),
            (Validating, Scheduled | AwaitingApproval | Error | Cancelled)
                | (AwaitingApproval, Scheduled | Cancelled)
                | (Scheduled, Executing | Cancelled)
                | (Executing, Success | Error | Cancelled)
        )
    }
}

impl fmt::Debug for ToolCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCall")
            .field("call_id", &self.call_id())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ToolCallStatus; 7] = [
        ToolCallStatus::Validating,
        ToolCallStatus::Scheduled,
        ToolCallStatus::AwaitingApproval,
        ToolCallStatus::Executing,
        ToolCallStatus::Success,
        ToolCallStatus::Error,
        ToolCallStatus::Cancelled,
    ];

    #[test]
    fn terminal_states_permit_nothing() {
        for from in ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!ToolCall::permits(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn every_non_terminal_state_can_cancel() {
        for from in ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(ToolCall::permits(from, ToolCallStatus::Cancelled), "{from}");
        }
    }

    #[test]
    fn approval_only_leads_to_scheduled_or_cancelled() {
        for to in ALL {
            let allowed = ToolCall::permits(ToolCallStatus::AwaitingApproval, to);
            assert_eq!(
                allowed,
                matches!(to, ToolCallStatus::Scheduled | ToolCallStatus::Cancelled),
                "awaiting_approval -> {to}"
            );
        }
    }

    #[test]
    fn execution_outcomes() {
        assert!(ToolCall::permits(
            ToolCallStatus::Executing,
            ToolCallStatus::Success
        ));
        assert!(ToolCall::permits(
            ToolCallStatus::Executing,
            ToolCallStatus::Error
        ));
        assert!(!ToolCall::permits(
            ToolCallStatus::Executing,
            ToolCallStatus::Scheduled
        ));
        assert!(!ToolCall::permits(
            ToolCallStatus::Success,
            ToolCallStatus::Executing
        ));
    }
}
