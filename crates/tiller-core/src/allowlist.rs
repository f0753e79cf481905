//! Allowlist pattern matching for tool invocations.
//!
//! A pattern is either `ToolName`, matching any invocation of that tool, or
//! `ToolName(argPrefix)`, matching shell invocations whose command equals the
//! prefix or begins with the prefix followed by a space. Shell commands with
//! chained operators match only when every sub-command matches on its own.

use serde_json::Value;
use tiller_tools::{DeclarativeTool, ToolKind};

use crate::shell::split_commands;

/// Alternate names the shell tool answers to in allowlist patterns.
pub const SHELL_TOOL_NAMES: &[&str] = &["run_shell_command", "run_terminal_command", "shell"];

/// The longest allowlist key for `command` given the configured stemmables.
///
/// Tokenizes with quote awareness, then greedily extends word-by-word while
/// the accumulated prefix is still a full-word prefix of some stemmable. If
/// the match covers the entire command the whole command is returned;
/// otherwise the matched prefix plus exactly one following token. A command
/// with an unrecognized root keys on the root token alone. Idempotent on its
/// own output.
pub fn command_prefix<S: AsRef<str>>(command: &str, stemmables: &[S]) -> String {
    let tokens = tokenize(command);
    if tokens.is_empty() {
        return String::new();
    }

    let mut matched = 0;
    for end in 1..=tokens.len() {
        let candidate = shell_words::join(&tokens[..end]);
        let is_stem = stemmables.iter().any(|stem| {
            let stem = stem.as_ref();
            stem == candidate || stem.starts_with(&format!("{candidate} "))
        });
        if is_stem {
            matched = end;
        } else {
            break;
        }
    }

    if matched == tokens.len() {
        shell_words::join(&tokens)
    } else {
        shell_words::join(&tokens[..=matched])
    }
}

fn tokenize(command: &str) -> Vec<String> {
    match shell_words::split(command) {
        Ok(tokens) => tokens,
        // Unbalanced quoting; fall back to plain whitespace tokens.
        Err(_) => command.split_whitespace().map(ToString::to_string).collect(),
    }
}

/// Decide whether an invocation of `tool` with `args` matches any pattern.
///
/// For shell-like tools carrying a `command` argument the command is split
/// into sub-commands and every one of them must independently match some
/// pattern; anything else matches on bare tool-name patterns only.
pub fn invocation_matches(
    tool: &dyn DeclarativeTool,
    args: &Value,
    patterns: &[String],
) -> bool {
    let names = candidate_names(tool);

    if is_shell_like(tool)
        && let Some(command) = args.get("command").and_then(Value::as_str)
    {
        let sub_commands = split_commands(command);
        if sub_commands.is_empty() {
            return false;
        }
        return sub_commands.iter().all(|sub| {
            patterns
                .iter()
                .any(|pattern| pattern_matches(pattern, &names, Some(sub)))
        });
    }

    patterns
        .iter()
        .any(|pattern| pattern_matches(pattern, &names, None))
}

fn is_shell_like(tool: &dyn DeclarativeTool) -> bool {
    tool.kind() == ToolKind::Execute || SHELL_TOOL_NAMES.contains(&tool.name())
}

/// Names a pattern may refer to this tool by: registry name, display name,
/// shell synonyms for shell-like tools, and the server alias of a dotted
/// MCP-style name.
fn candidate_names(tool: &dyn DeclarativeTool) -> Vec<String> {
    let mut names = vec![tool.name().to_string()];
    if !tool.display_name().is_empty() && tool.display_name() != tool.name() {
        names.push(tool.display_name().to_string());
    }
    if is_shell_like(tool) {
        for synonym in SHELL_TOOL_NAMES {
            if !names.iter().any(|n| n == synonym) {
                names.push((*synonym).to_string());
            }
        }
    }
    if let Some((server, _)) = tool.name().split_once('.') {
        names.push(server.to_string());
    }
    names
}

fn pattern_matches(pattern: &str, names: &[String], command: Option<&str>) -> bool {
    match pattern.find('(') {
        None => names.iter().any(|name| name == pattern),
        Some(open) => {
            // Unterminated patterns never match.
            let Some(stripped) = pattern.strip_suffix(')') else {
                return false;
            };
            let tool_name = &pattern[..open];
            if !names.iter().any(|name| name == tool_name) {
                return false;
            }
            let Some(command) = command else {
                return false;
            };
            let Some(arg_prefix) = stripped.get(open + 1..) else {
                return false;
            };
            command == arg_prefix || command.starts_with(&format!("{arg_prefix} "))
        }
    }
}
