use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::registry::ToolRegistry;

/// Session-wide policy gating tool confirmations.
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
pub enum ApprovalMode {
    /// Prompt on every call that is not allowlisted.
    Default,
    /// Skip confirmation for edit-kind tools.
    AutoEdit,
    /// Skip all confirmations.
    Yolo,
}

const DEFAULT_TRUNCATE_THRESHOLD: usize = 4_000_000;
const DEFAULT_TRUNCATE_LINES: usize = 1000;

/// Command roots whose allowlist granularity extends one sub-command deeper,
/// e.g. approving `gh run view` allowlists `gh run`-anything rather than all
/// of `gh`.
const DEFAULT_COMMAND_STEMMABLES: &[&str] = &[
    "git",
    "gh run",
    "npm run",
    "pnpm run",
    "yarn run",
    "cargo",
    "go",
    "docker",
    "kubectl",
];

/// Shared configuration handle the scheduler reads through on every check.
///
/// Approval mode and the session allowlist are process-wide and mutable from
/// confirmation outcomes, so they live behind locks and are never cached by
/// callers.
pub struct SessionConfig {
    registry: Arc<dyn ToolRegistry>,
    temp_dir: PathBuf,
    truncate_threshold: usize,
    truncate_lines: usize,
    command_stemmables: Vec<String>,
    approval_mode: RwLock<ApprovalMode>,
    allowed_tools: RwLock<Vec<String>>,
}

impl SessionConfig {
    pub fn new(registry: Arc<dyn ToolRegistry>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            temp_dir: temp_dir.into(),
            truncate_threshold: DEFAULT_TRUNCATE_THRESHOLD,
            truncate_lines: DEFAULT_TRUNCATE_LINES,
            command_stemmables: DEFAULT_COMMAND_STEMMABLES
                .iter()
                .map(ToString::to_string)
                .collect(),
            approval_mode: RwLock::new(ApprovalMode::Default),
            allowed_tools: RwLock::new(Vec::new()),
        }
    }

    pub fn with_approval_mode(self, mode: ApprovalMode) -> Self {
        self.set_approval_mode(mode);
        self
    }

    pub fn with_allowed_tools(self, patterns: Vec<String>) -> Self {
        match self.allowed_tools.write() {
            Ok(mut guard) => *guard = patterns,
            Err(mut poisoned) => **poisoned.get_mut() = patterns,
        }
        self
    }

    pub fn with_truncation(mut self, threshold: usize, lines: usize) -> Self {
        self.truncate_threshold = threshold;
        self.truncate_lines = lines;
        self
    }

    pub fn with_command_stemmables(mut self, stemmables: Vec<String>) -> Self {
        self.command_stemmables = stemmables;
        self
    }

    pub fn registry(&self) -> &Arc<dyn ToolRegistry> {
        &self.registry
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn truncate_threshold(&self) -> usize {
        self.truncate_threshold
    }

    pub fn truncate_lines(&self) -> usize {
        self.truncate_lines
    }

    pub fn command_stemmables(&self) -> &[String] {
        &self.command_stemmables
    }

    pub fn approval_mode(&self) -> ApprovalMode {
        match self.approval_mode.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set_approval_mode(&self, mode: ApprovalMode) {
        match self.approval_mode.write() {
            Ok(mut guard) => *guard = mode,
            Err(mut poisoned) => **poisoned.get_mut() = mode,
        }
    }

    /// Snapshot of the session allowlist.
    pub fn allowed_tools(&self) -> Vec<String> {
        match self.allowed_tools.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Append a pattern to the session allowlist, deduplicating.
    pub fn allow_tool_pattern(&self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        let mut guard = match self.allowed_tools.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !guard.contains(&pattern) {
            guard.push(pattern);
        }
    }
}
