//! Post-processing of oversized tool output.
//!
//! Output beyond the configured threshold is cut down to a head-and-tail
//! excerpt for the model while the full text is spilled to a file the model
//! can page through with the `read_file` tool.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Literal separator between the head and tail of a truncated excerpt.
pub const TRUNCATION_SEPARATOR: &str = "... [CONTENT TRUNCATED] ...";

/// Appended to the excerpt when the full output could not be written.
pub const SPILL_FAILED_NOTE: &str = "[Note: Could not save full output to file]";

const WRAP_WIDTH: usize = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct SavedOutput {
    pub content: String,
    /// Where the full output was written, when the spill succeeded.
    pub output_file: Option<PathBuf>,
}

/// Truncate `content` to a head+tail excerpt and spill the full text to
/// `temp_dir/<call_id basename>.output`.
///
/// A no-op below `threshold` bytes. The returned content explains the
/// truncation, names the spill file, and tells the model how to read the
/// rest. Spill failures are non-fatal: the excerpt is annotated and no file
/// path is reported.
pub async fn truncate_and_save_to_file(
    content: &str,
    call_id: &str,
    temp_dir: &Path,
    threshold: usize,
    truncate_lines: usize,
) -> SavedOutput {
    if content.len() <= threshold {
        return SavedOutput {
            content: content.to_string(),
            output_file: None,
        };
    }

    let lines = normalize_lines(content);
    let excerpt = excerpt_lines(&lines, truncate_lines);

    let file_name = format!("{}.output", sanitize_file_stem(call_id));
    let path = temp_dir.join(file_name);

    match tokio::fs::write(&path, lines.join("\n")).await {
        Ok(()) => {
            let path = std::path::absolute(&path).unwrap_or(path);
            let content = format!(
                "Tool output was too large and was truncated to the excerpt below.\n\
                 The complete output has been saved to: {}\n\
                 Use the read_file tool with its offset and limit parameters to read the rest.\n\n\
                 {excerpt}",
                path.display()
            );
            SavedOutput {
                content,
                output_file: Some(path),
            }
        }
        Err(error) => {
            warn!(
                target: "tool_output",
                call_id,
                path = %path.display(),
                %error,
                "failed to spill full tool output"
            );
            SavedOutput {
                content: format!(
                    "Tool output was too large and was truncated to the excerpt below.\n\
                     {SPILL_FAILED_NOTE}\n\n\
                     {excerpt}"
                ),
                output_file: None,
            }
        }
    }
}

/// Line list used for both the excerpt and the spill file. Inputs that are
/// already line-shaped (more than one line, at least half within the wrap
/// width) pass through untouched; everything else is hard-wrapped at 120
/// columns so a single enormous line still truncates meaningfully.
fn normalize_lines(content: &str) -> Vec<String> {
    let raw: Vec<&str> = content.split('\n').collect();
    let short = raw
        .iter()
        .filter(|line| line.chars().count() <= WRAP_WIDTH)
        .count();

    if raw.len() > 1 && short * 2 >= raw.len() {
        return raw.into_iter().map(ToString::to_string).collect();
    }

    raw.into_iter()
        .flat_map(|line| {
            if line.is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, WRAP_WIDTH)
                    .into_iter()
                    .map(|wrapped| wrapped.into_owned())
                    .collect()
            }
        })
        .collect()
}

fn excerpt_lines(lines: &[String], truncate_lines: usize) -> String {
    if lines.len() <= truncate_lines {
        return lines.join("\n");
    }
    let head = truncate_lines / 5;
    let tail = truncate_lines - head;
    let mut excerpt = lines[..head].join("\n");
    excerpt.push('\n');
    excerpt.push_str(TRUNCATION_SEPARATOR);
    excerpt.push('\n');
    excerpt.push_str(&lines[lines.len() - tail..].join("\n"));
    excerpt
}

/// Strip any directory components from `call_id` so the spill file always
/// lands directly inside the temp dir.
fn sanitize_file_stem(call_id: &str) -> String {
    Path::new(call_id)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("tool-output")
        .to_string()
}
