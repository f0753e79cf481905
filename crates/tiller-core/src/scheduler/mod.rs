//! The core tool scheduler.
//!
//! `ToolScheduler` admits batches of tool-call requests and drives each call
//! through validation, confirmation, execution, and completion. A single
//! worker task owns all mutable state; handles talk to it over a channel, so
//! overlapping `schedule` calls are admitted eagerly and processed strictly
//! in submission order, and confirmation replies are just messages keyed by
//! call id.

mod call;

pub use call::{CallBase, CallError, ToolCall, ToolCallResponse, ToolCallStatus};

use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use tiller_tools::{
    ConfirmationOutcome, ConfirmationPayload, ConfirmationRequest, DeclarativeTool, FileDiff,
    LiveOutput, LiveOutputChunk, ResultDisplay, ToolCallRequest, ToolContent, ToolError, ToolKind,
    ToolResult,
};

use crate::allowlist::{command_prefix, invocation_matches};
use crate::config::{ApprovalMode, SessionConfig};
use crate::error::{ErrorKind, SchedulerError, SchedulerResult};
use crate::output::truncate_and_save_to_file;
use crate::response::to_function_response;
use crate::shell::split_commands;
use crate::suggestion::unknown_tool_suggestion;

/// External editors the host can open a diff in.
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
pub enum EditorKind {
    VsCode,
    Vim,
    Neovim,
    Emacs,
    Zed,
}

/// What the host needs to run an external diff-edit session.
#[derive(Debug, Clone)]
pub struct DiffEditRequest {
    pub file_path: Option<PathBuf>,
    pub file_name: String,
    pub original: String,
    pub proposed: String,
}

/// Observer and host-integration surface of the scheduler.
///
/// `tool_calls_update` fires on every status or payload change with the full
/// batch snapshot in stable insertion order; `all_tool_calls_complete` fires
/// exactly once per batch, strictly after the last update, with every call
/// terminal.
#[async_trait]
pub trait SchedulerEvents: Send + Sync {
    fn tool_calls_update(&self, calls: &[ToolCall]);

    fn all_tool_calls_complete(&self, calls: &[ToolCall]);

    /// The editor to use for `ModifyWithEditor`, if the host has one.
    fn preferred_editor(&self) -> Option<EditorKind> {
        None
    }

    /// Run an external diff-edit session and return the edited content.
    async fn open_diff_editor(
        &self,
        _editor: EditorKind,
        _request: DiffEditRequest,
    ) -> Result<String, ToolError> {
        Err(ToolError::Internal(
            "no external editor integration".to_string(),
        ))
    }

    fn editor_closed(&self) {}
}

enum SchedulerMessage {
    Schedule {
        requests: Vec<ToolCallRequest>,
        token: CancellationToken,
        done: oneshot::Sender<()>,
    },
    Confirm {
        call_id: String,
        outcome: ConfirmationOutcome,
        payload: Option<ConfirmationPayload>,
    },
}

/// Handle to the scheduler worker. Cheap to clone; dropping every handle
/// shuts the worker down once the in-flight batch finishes.
#[derive(Clone)]
pub struct ToolScheduler {
    tx: mpsc::UnboundedSender<SchedulerMessage>,
}

impl ToolScheduler {
    /// Spawn the scheduler worker. Must be called from within a Tokio
    /// runtime.
    pub fn new(config: Arc<SessionConfig>, events: Arc<dyn SchedulerEvents>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = SchedulerWorker {
            config,
            events,
            queue: VecDeque::new(),
        };
        tokio::spawn(worker.run(rx));
        Self { tx }
    }

    /// Admit a batch of requests.
    ///
    /// The batch is enqueued synchronously, before the returned future is
    /// first polled, so back-to-back `schedule` calls are admitted in call
    /// order. The future resolves once every call in the batch is terminal
    /// and the completion observer has fired. Tool failures never surface
    /// here.
    pub fn schedule(
        &self,
        requests: Vec<ToolCallRequest>,
        token: CancellationToken,
    ) -> impl Future<Output = SchedulerResult<()>> + Send + use<> {
        debug!(target: "tool_scheduler", requests = requests.len(), "batch admitted");
        let (done_tx, done_rx) = oneshot::channel();
        let admitted = self
            .tx
            .send(SchedulerMessage::Schedule {
                requests,
                token,
                done: done_tx,
            })
            .map_err(|_| SchedulerError::WorkerGone);
        async move {
            admitted?;
            done_rx.await.map_err(|_| SchedulerError::WorkerGone)
        }
    }

    /// Deliver the user's answer for a call that is awaiting approval.
    ///
    /// Replies for calls that already left `awaiting_approval` are dropped.
    pub fn resolve_confirmation(
        &self,
        call_id: impl Into<String>,
        outcome: ConfirmationOutcome,
        payload: Option<ConfirmationPayload>,
    ) -> SchedulerResult<()> {
        self.tx
            .send(SchedulerMessage::Confirm {
                call_id: call_id.into(),
                outcome,
                payload,
            })
            .map_err(|_| SchedulerError::WorkerGone)
    }
}

struct PendingBatch {
    requests: Vec<ToolCallRequest>,
    token: CancellationToken,
    done: oneshot::Sender<()>,
}

struct SchedulerWorker {
    config: Arc<SessionConfig>,
    events: Arc<dyn SchedulerEvents>,
    queue: VecDeque<PendingBatch>,
}

impl SchedulerWorker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SchedulerMessage>) {
        loop {
            if let Some(batch) = self.queue.pop_front() {
                self.run_batch(batch, &mut rx).await;
                continue;
            }
            match rx.recv().await {
                None => break,
                Some(SchedulerMessage::Schedule {
                    requests,
                    token,
                    done,
                }) => self.queue.push_back(PendingBatch {
                    requests,
                    token,
                    done,
                }),
                Some(SchedulerMessage::Confirm { call_id, .. }) => {
                    debug!(
                        target: "tool_scheduler",
                        call_id,
                        "dropping confirmation with no batch in flight"
                    );
                }
            }
        }
    }

    async fn run_batch(
        &mut self,
        batch: PendingBatch,
        rx: &mut mpsc::UnboundedReceiver<SchedulerMessage>,
    ) {
        let mut run = BatchRun::new(
            self.config.clone(),
            self.events.clone(),
            batch.requests,
            batch.token,
        );
        run.intake().await;
        run.drive(rx, &mut self.queue).await;
        self.events.all_tool_calls_complete(&run.calls);
        if batch.done.send(()).is_err() {
            debug!(target: "tool_scheduler", "batch caller went away before completion");
        }
    }
}

/// One batch moving through the scheduler; owns the only mutable view of its
/// calls.
struct BatchRun {
    config: Arc<SessionConfig>,
    events: Arc<dyn SchedulerEvents>,
    token: CancellationToken,
    calls: Vec<ToolCall>,
}

impl BatchRun {
    fn new(
        config: Arc<SessionConfig>,
        events: Arc<dyn SchedulerEvents>,
        requests: Vec<ToolCallRequest>,
        token: CancellationToken,
    ) -> Self {
        let calls = requests
            .into_iter()
            .map(|request| ToolCall::Validating {
                base: CallBase::new(request),
            })
            .collect();
        Self {
            config,
            events,
            token,
            calls,
        }
    }

    fn emit_update(&self) {
        self.events.tool_calls_update(&self.calls);
    }

    fn all_terminal(&self) -> bool {
        self.calls.iter().all(ToolCall::is_terminal)
    }

    fn any_awaiting(&self) -> bool {
        self.calls
            .iter()
            .any(|call| call.status() == ToolCallStatus::AwaitingApproval)
    }

    fn position(&self, call_id: &str) -> Option<usize> {
        self.calls.iter().position(|call| call.call_id() == call_id)
    }

    /// Run the entry protocol for every request, in order.
    async fn intake(&mut self) {
        self.emit_update();
        for idx in 0..self.calls.len() {
            self.intake_one(idx).await;
        }
    }

    async fn intake_one(&mut self, idx: usize) {
        let request = self.calls[idx].base().request.clone();

        let Some(tool) = self.config.registry().get_tool(&request.name) else {
            let known = self.config.registry().tool_names();
            let suggestion = unknown_tool_suggestion(&request.name, &known).unwrap_or_default();
            let message = format!(
                "Tool \"{}\" not found in registry.{}",
                request.name, suggestion
            );
            self.fail(idx, ErrorKind::ToolNotFound, message);
            return;
        };
        self.calls[idx].base_mut().tool = Some(tool.clone());

        let invocation = match tool.build_invocation(request.args.clone()) {
            Ok(invocation) => invocation,
            Err(err) => {
                self.fail(idx, ErrorKind::InvalidParameters, err.to_string());
                return;
            }
        };
        self.calls[idx].base_mut().invocation = Some(invocation.clone());

        if self.token.is_cancelled() {
            self.cancel(idx, "Operation was aborted before the tool could run");
            return;
        }

        if self.auto_approved(tool.as_ref(), &request.args) {
            self.transition_scheduled(idx);
            return;
        }

        let token = self.token.clone();
        let confirm = tokio::select! {
            biased;
            _ = token.cancelled() => {
                self.cancel(idx, "Operation was aborted during confirmation");
                return;
            }
            result = invocation.should_confirm(&token) => result,
        };

        match confirm {
            Ok(None) => self.transition_scheduled(idx),
            Ok(Some(confirmation)) => self.transition_awaiting(idx, confirmation),
            Err(err) => {
                // A failure with a fired signal is a cancellation, not an error.
                if self.token.is_cancelled() || err.is_cancellation() {
                    self.cancel(idx, &err.to_string());
                } else {
                    self.fail(
                        idx,
                        ErrorKind::ExecutionFailed,
                        format!("Confirmation check failed: {err}"),
                    );
                }
            }
        }
    }

    /// Confirmation short-circuits: Yolo mode, AutoEdit for edit-kind tools,
    /// or an allowlist match. Reads approval mode and allowlist through the
    /// config on every check.
    fn auto_approved(&self, tool: &dyn DeclarativeTool, args: &serde_json::Value) -> bool {
        let mode = self.config.approval_mode();
        if mode == ApprovalMode::Yolo {
            return true;
        }
        if mode == ApprovalMode::AutoEdit && tool.kind() == ToolKind::Edit {
            return true;
        }
        invocation_matches(tool, args, &self.config.allowed_tools())
    }

    /// Wait for confirmations and run scheduled calls until the batch is
    /// fully terminal.
    async fn drive(
        &mut self,
        rx: &mut mpsc::UnboundedReceiver<SchedulerMessage>,
        pending: &mut VecDeque<PendingBatch>,
    ) {
        let token = self.token.clone();
        loop {
            if self.all_terminal() {
                return;
            }
            if !self.any_awaiting() {
                self.execute_scheduled(rx, pending).await;
                continue;
            }
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    self.cancel_remaining("User cancelled the batch");
                }
                message = rx.recv() => match message {
                    None => self.cancel_remaining("Scheduler handle dropped"),
                    Some(SchedulerMessage::Schedule { requests, token, done }) => {
                        pending.push_back(PendingBatch { requests, token, done });
                    }
                    Some(SchedulerMessage::Confirm { call_id, outcome, payload }) => {
                        self.handle_confirmation(&call_id, outcome, payload).await;
                    }
                },
            }
        }
    }

    /// Move every scheduled call to executing and drive the executions
    /// concurrently to completion.
    async fn execute_scheduled(
        &mut self,
        rx: &mut mpsc::UnboundedReceiver<SchedulerMessage>,
        pending: &mut VecDeque<PendingBatch>,
    ) {
        let scheduled: Vec<usize> = self
            .calls
            .iter()
            .enumerate()
            .filter(|(_, call)| call.status() == ToolCallStatus::Scheduled)
            .map(|(idx, _)| idx)
            .collect();

        let (live_tx, mut live_rx) = mpsc::unbounded_channel::<LiveOutputChunk>();
        let mut executions = FuturesUnordered::new();

        for idx in scheduled {
            let base = self.calls[idx].base().clone();
            self.set_state(
                idx,
                ToolCall::Executing {
                    base: base.clone(),
                    live_output: None,
                },
            );

            let Some(invocation) = base.invocation.clone() else {
                self.fail(idx, ErrorKind::ExecutionFailed, "call has no invocation");
                continue;
            };
            let token = self.token.clone();
            let call_id = base.request.call_id.clone();
            let tool_name = base.request.name.clone();
            let live = LiveOutput::new(call_id.clone(), live_tx.clone());
            executions.push(async move {
                let result = tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(ToolError::Cancelled(tool_name)),
                    result = invocation.execute(token.clone(), Some(live)) => result,
                };
                (call_id, result)
            });
        }
        drop(live_tx);

        let mut handle_open = true;
        while !executions.is_empty() {
            tokio::select! {
                biased;
                Some(chunk) = live_rx.recv() => self.append_live_output(chunk),
                completed = executions.next() => {
                    if let Some((call_id, result)) = completed {
                        self.finish_execution(&call_id, result).await;
                    }
                }
                message = rx.recv(), if handle_open => match message {
                    None => handle_open = false,
                    Some(SchedulerMessage::Schedule { requests, token, done }) => {
                        pending.push_back(PendingBatch { requests, token, done });
                    }
                    Some(SchedulerMessage::Confirm { call_id, .. }) => {
                        debug!(
                            target: "tool_scheduler",
                            call_id,
                            "dropping confirmation for a call that is no longer awaiting approval"
                        );
                    }
                },
            }
        }
    }

    async fn finish_execution(&mut self, call_id: &str, result: Result<ToolResult, ToolError>) {
        let Some(idx) = self.position(call_id) else {
            warn!(target: "tool_scheduler", call_id, "execution finished for unknown call");
            return;
        };
        match result {
            Ok(tool_result) => {
                let base = self.calls[idx].base().clone();
                let content = self.post_process(&base.request.call_id, tool_result.llm_content).await;
                let parts = to_function_response(&base.request.name, &base.request.call_id, &content);
                let response = ToolCallResponse::success(call_id, parts, tool_result.display);
                let duration = base.started_at.elapsed();
                self.set_state(
                    idx,
                    ToolCall::Success {
                        base,
                        response,
                        duration,
                    },
                );
            }
            Err(err) if err.is_cancellation() || self.token.is_cancelled() => {
                self.cancel(idx, &err.to_string());
            }
            Err(err) => {
                self.fail(idx, ErrorKind::ExecutionFailed, err.to_string());
            }
        }
    }

    /// Spill oversized text output to disk and swap in the truncated excerpt.
    async fn post_process(&self, call_id: &str, content: ToolContent) -> ToolContent {
        match content {
            ToolContent::Text(text) if text.len() > self.config.truncate_threshold() => {
                let saved = truncate_and_save_to_file(
                    &text,
                    call_id,
                    self.config.temp_dir(),
                    self.config.truncate_threshold(),
                    self.config.truncate_lines(),
                )
                .await;
                ToolContent::Text(saved.content)
            }
            other => other,
        }
    }

    fn append_live_output(&mut self, chunk: LiveOutputChunk) {
        let Some(idx) = self.position(&chunk.call_id) else {
            return;
        };
        if let ToolCall::Executing { live_output, .. } = &mut self.calls[idx] {
            match live_output {
                Some(buffer) => buffer.push_str(&chunk.chunk),
                None => *live_output = Some(chunk.chunk),
            }
            self.emit_update();
        }
    }

    async fn handle_confirmation(
        &mut self,
        call_id: &str,
        outcome: ConfirmationOutcome,
        payload: Option<ConfirmationPayload>,
    ) {
        let Some(idx) = self.position(call_id) else {
            debug!(target: "tool_scheduler", call_id, "confirmation for unknown call");
            return;
        };
        if self.calls[idx].status() != ToolCallStatus::AwaitingApproval {
            debug!(
                target: "tool_scheduler",
                call_id,
                status = %self.calls[idx].status(),
                "confirmation for a call that is not awaiting approval"
            );
            return;
        }

        self.calls[idx].base_mut().outcome = Some(outcome);

        match outcome {
            ConfirmationOutcome::Cancel => {
                self.cancel(idx, "User did not allow the tool call");
            }
            ConfirmationOutcome::ModifyWithEditor => {
                self.modify_with_editor(idx).await;
            }
            ConfirmationOutcome::ProceedOnce
            | ConfirmationOutcome::ProceedAlways
            | ConfirmationOutcome::ProceedAlwaysServer
            | ConfirmationOutcome::ProceedAlwaysTool => {
                if outcome != ConfirmationOutcome::ProceedOnce {
                    self.remember_approval(idx, outcome);
                }
                if let Some(payload) = payload {
                    self.apply_payload(idx, &payload);
                }
                self.transition_scheduled(idx);
                if outcome != ConfirmationOutcome::ProceedOnce {
                    // Mode and allowlist changed; re-check everything still
                    // waiting in this batch against the shared state.
                    self.reevaluate_waiting();
                }
            }
        }
    }

    /// Record a standing approval on the shared session state.
    fn remember_approval(&self, idx: usize, outcome: ConfirmationOutcome) {
        let call = &self.calls[idx];
        let Some(tool) = call.base().tool.clone() else {
            return;
        };
        match (outcome, call.confirmation()) {
            (ConfirmationOutcome::ProceedAlways, Some(ConfirmationRequest::Edit { .. })) => {
                self.config.set_approval_mode(ApprovalMode::AutoEdit);
            }
            (ConfirmationOutcome::ProceedAlways, Some(ConfirmationRequest::Exec { command, .. })) => {
                for sub_command in split_commands(command) {
                    let prefix = command_prefix(&sub_command, self.config.command_stemmables());
                    if !prefix.is_empty() {
                        self.config
                            .allow_tool_pattern(format!("{}({})", tool.name(), prefix));
                    }
                }
            }
            (
                ConfirmationOutcome::ProceedAlwaysServer,
                Some(ConfirmationRequest::Mcp { server_name, .. }),
            ) => {
                self.config.allow_tool_pattern(server_name.clone());
            }
            (
                ConfirmationOutcome::ProceedAlways | ConfirmationOutcome::ProceedAlwaysTool,
                Some(ConfirmationRequest::Mcp { tool_name, .. }),
            ) => {
                self.config.allow_tool_pattern(tool_name.clone());
            }
            _ => {
                self.config.allow_tool_pattern(tool.name().to_string());
            }
        }
    }

    /// Replace the call's arguments with user-revised content and rebuild
    /// its invocation before execution.
    fn apply_payload(&mut self, idx: usize, payload: &ConfirmationPayload) {
        let base = self.calls[idx].base().clone();
        let Some(tool) = base.tool.clone() else {
            return;
        };
        let Some(modifiable) = tool.as_modifiable() else {
            debug!(
                target: "tool_scheduler",
                call_id = %base.request.call_id,
                "payload ignored: tool is not modifiable"
            );
            return;
        };

        let original = match self.calls[idx].confirmation() {
            Some(ConfirmationRequest::Edit {
                original_content, ..
            }) => original_content.clone().unwrap_or_default(),
            _ => base
                .pending_diff
                .as_ref()
                .and_then(|diff| diff.original_content.clone())
                .unwrap_or_default(),
        };

        let new_args = modifiable.updated_args(&original, &payload.new_content, &base.request.args);
        match tool.build_invocation(new_args.clone()) {
            Ok(invocation) => {
                let base = self.calls[idx].base_mut();
                base.request.args = new_args;
                base.invocation = Some(invocation);
                if let Some(diff) = base.pending_diff.as_mut() {
                    diff.new_content = payload.new_content.clone();
                }
            }
            Err(err) => {
                warn!(
                    target: "tool_scheduler",
                    call_id = %base.request.call_id,
                    %err,
                    "could not rebuild invocation from payload; keeping original arguments"
                );
            }
        }
    }

    /// Re-run the auto-approval checks for every call still awaiting
    /// approval, scheduling the ones the updated mode or allowlist now
    /// covers.
    fn reevaluate_waiting(&mut self) {
        for idx in 0..self.calls.len() {
            if self.calls[idx].status() != ToolCallStatus::AwaitingApproval {
                continue;
            }
            let base = self.calls[idx].base();
            let Some(tool) = base.tool.clone() else {
                continue;
            };
            let args = base.request.args.clone();
            if self.auto_approved(tool.as_ref(), &args) {
                self.transition_scheduled(idx);
            }
        }
    }

    /// Run the external-editor modification flow for an awaiting edit.
    async fn modify_with_editor(&mut self, idx: usize) {
        let Some(editor) = self.events.preferred_editor() else {
            debug!(target: "tool_scheduler", "modify requested but no preferred editor");
            return;
        };
        let base = self.calls[idx].base().clone();
        let Some(tool) = base.tool.clone() else {
            return;
        };
        let Some(modifiable) = tool.as_modifiable() else {
            debug!(
                target: "tool_scheduler",
                call_id = %base.request.call_id,
                "modify requested for a non-modifiable tool"
            );
            return;
        };

        self.set_modifying(idx, true);

        let args = base.request.args.clone();
        let current = match modifiable.current_content(&args).await {
            Ok(content) => content,
            Err(err) => {
                warn!(target: "tool_scheduler", %err, "could not read current content");
                self.set_modifying(idx, false);
                return;
            }
        };
        let proposed = match modifiable.proposed_content(&args).await {
            Ok(content) => content,
            Err(err) => {
                warn!(target: "tool_scheduler", %err, "could not build proposed content");
                self.set_modifying(idx, false);
                return;
            }
        };

        let file_path = modifiable.file_path(&args);
        let file_name = file_path
            .as_ref()
            .and_then(|path| path.file_name())
            .and_then(|name| name.to_str())
            .unwrap_or(&base.request.name)
            .to_string();

        let edited = self
            .events
            .open_diff_editor(
                editor,
                DiffEditRequest {
                    file_path,
                    file_name: file_name.clone(),
                    original: current.clone(),
                    proposed,
                },
            )
            .await;
        self.events.editor_closed();

        let new_content = match edited {
            Ok(content) => content,
            Err(err) => {
                warn!(target: "tool_scheduler", %err, "editor session failed");
                self.set_modifying(idx, false);
                return;
            }
        };

        let new_args = modifiable.updated_args(&current, &new_content, &args);
        let invocation = match tool.build_invocation(new_args.clone()) {
            Ok(invocation) => invocation,
            Err(err) => {
                warn!(
                    target: "tool_scheduler",
                    %err,
                    "could not rebuild invocation after editor session"
                );
                self.set_modifying(idx, false);
                return;
            }
        };

        let file_diff = unified_diff(&file_name, &current, &new_content);
        {
            let base = self.calls[idx].base_mut();
            base.request.args = new_args;
            base.invocation = Some(invocation);
            base.pending_diff = Some(FileDiff {
                file_diff: file_diff.clone(),
                file_name: file_name.clone(),
                original_content: Some(current.clone()),
                new_content: new_content.clone(),
            });
        }
        if let ToolCall::AwaitingApproval { confirmation, .. } = &mut self.calls[idx]
            && let ConfirmationRequest::Edit {
                file_diff: diff,
                original_content,
                new_content: proposed,
                is_modifying,
                ..
            } = confirmation
        {
            *diff = file_diff;
            *original_content = Some(current);
            *proposed = new_content;
            *is_modifying = false;
        }
        self.emit_update();
    }

    fn set_modifying(&mut self, idx: usize, flag: bool) {
        if let ToolCall::AwaitingApproval { confirmation, .. } = &mut self.calls[idx]
            && let ConfirmationRequest::Edit { is_modifying, .. } = confirmation
        {
            *is_modifying = flag;
            self.emit_update();
        }
    }

    fn transition_scheduled(&mut self, idx: usize) {
        let base = self.calls[idx].base().clone();
        self.set_state(idx, ToolCall::Scheduled { base });
    }

    fn transition_awaiting(&mut self, idx: usize, confirmation: ConfirmationRequest) {
        let mut base = self.calls[idx].base().clone();
        if let ConfirmationRequest::Edit {
            file_diff,
            file_name,
            original_content,
            new_content,
            ..
        } = &confirmation
        {
            base.pending_diff = Some(FileDiff {
                file_diff: file_diff.clone(),
                file_name: file_name.clone(),
                original_content: original_content.clone(),
                new_content: new_content.clone(),
            });
        }
        self.set_state(idx, ToolCall::AwaitingApproval { base, confirmation });
    }

    fn fail(&mut self, idx: usize, kind: ErrorKind, message: impl Into<String>) {
        let base = self.calls[idx].base().clone();
        let response = ToolCallResponse::error(
            &base.request.name,
            &base.request.call_id,
            kind,
            message.into(),
        );
        let duration = base.started_at.elapsed();
        self.set_state(
            idx,
            ToolCall::Error {
                base,
                response,
                duration,
            },
        );
    }

    fn cancel(&mut self, idx: usize, reason: &str) {
        let base = self.calls[idx].base().clone();
        let display = base.pending_diff.clone().map(ResultDisplay::Diff);
        let response = ToolCallResponse::cancelled(
            &base.request.name,
            &base.request.call_id,
            reason,
            display,
        );
        let duration = base.started_at.elapsed();
        self.set_state(
            idx,
            ToolCall::Cancelled {
                base,
                response,
                duration,
            },
        );
    }

    fn cancel_remaining(&mut self, reason: &str) {
        for idx in 0..self.calls.len() {
            if !self.calls[idx].is_terminal() {
                self.cancel(idx, reason);
            }
        }
    }

    /// Apply a transition, enforcing the legal relation; illegal requests
    /// are logged and ignored so a scheduler bug cannot corrupt a batch.
    fn set_state(&mut self, idx: usize, next: ToolCall) {
        let from = self.calls[idx].status();
        let to = next.status();
        if !ToolCall::permits(from, to) {
            error!(
                target: "tool_scheduler",
                call_id = %self.calls[idx].call_id(),
                %from,
                %to,
                "illegal state transition ignored"
            );
            return;
        }
        self.calls[idx] = next;
        self.emit_update();
    }
}

fn unified_diff(file_name: &str, old: &str, new: &str) -> String {
    let diff = similar::TextDiff::from_lines(old, new);
    let mut unified = diff.unified_diff();
    unified
        .context_radius(3)
        .header(&format!("a/{file_name}"), &format!("b/{file_name}"))
        .to_string()
}
