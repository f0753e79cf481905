use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a tool call ended in a non-success terminal state.
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
pub enum ErrorKind {
    ToolNotFound,
    InvalidParameters,
    ConfirmationAborted,
    ExecutionFailed,
    OutputSpillFailed,
}

/// Errors surfaced by the scheduler handle itself.
///
/// Tool-level failures never take this path; they land on the affected
/// call as a terminal `error` or `cancelled` state.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("scheduler worker is no longer running")]
    WorkerGone,
}

pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
