//! Normalization of tool output into the function-response envelope.
//!
//! Whatever shape a tool returns, the model always sees a part list that
//! starts with a single `functionResponse` envelope; binary parts ride along
//! after it.

use tiller_tools::{Part, ToolContent};

/// Envelope output when the tool returned nothing the model can read inline.
pub const DEFAULT_SUCCESS_OUTPUT: &str = "Tool execution succeeded.";

fn binary_notice(mime_type: &str) -> String {
    format!("Binary content of type {mime_type} was processed.")
}

/// Convert a tool's content into the part list sent back to the model.
pub fn to_function_response(tool_name: &str, call_id: &str, content: &ToolContent) -> Vec<Part> {
    let envelope =
        |output: String| Part::function_response(tool_name, call_id, output);

    match content {
        ToolContent::Text(text) => vec![envelope(text.clone())],
        ToolContent::Part(part) => convert_single(part, false, &envelope),
        ToolContent::Parts(parts) => match parts.as_slice() {
            [single] => convert_single(single, true, &envelope),
            _ => {
                let mut response = vec![envelope(DEFAULT_SUCCESS_OUTPUT.to_string())];
                response.extend(parts.iter().cloned());
                response
            }
        },
    }
}

fn convert_single(
    part: &Part,
    from_list: bool,
    envelope: &dyn Fn(String) -> Part,
) -> Vec<Part> {
    if let Some(text) = part.as_text() {
        return vec![envelope(text.to_string())];
    }
    if let Some(mime_type) = part.mime_type() {
        return vec![envelope(binary_notice(mime_type)), part.clone()];
    }
    // Generic part: nothing inline to report.
    if from_list {
        vec![envelope(DEFAULT_SUCCESS_OUTPUT.to_string()), part.clone()]
    } else {
        vec![envelope(DEFAULT_SUCCESS_OUTPUT.to_string())]
    }
}
