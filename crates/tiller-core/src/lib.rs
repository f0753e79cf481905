//! Core tool-call scheduling for an AI-assistant tool-invocation runtime.
//!
//! The scheduler sits between a model-driven orchestrator and the effectful
//! tools it wants to run: it validates each request, gates it on the session
//! allowlist and approval mode, drives user confirmation, executes approved
//! calls, and normalizes the results for the model. Tool implementations,
//! the model client, and the UI all live on the far side of the seams in
//! `tiller-tools`.

pub mod allowlist;
pub mod config;
pub mod error;
pub mod output;
pub mod registry;
pub mod response;
pub mod scheduler;
pub mod shell;
pub mod suggestion;

pub use config::{ApprovalMode, SessionConfig};
pub use error::{ErrorKind, SchedulerError};
pub use registry::{StaticToolRegistry, ToolRegistry};
pub use scheduler::{
    CallError, DiffEditRequest, EditorKind, SchedulerEvents, ToolCall, ToolCallResponse,
    ToolCallStatus, ToolScheduler,
};
