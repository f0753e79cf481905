//! Model-facing content parts.
//!
//! Tools hand back `ToolContent`; the scheduler normalizes it into a list of
//! `Part`s beginning with a function-response envelope before it goes back to
//! the model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inline binary payload, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

/// Reference to binary content stored elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponseBody {
    pub output: String,
}

/// The envelope returned to the model for a completed tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub name: String,
    pub id: String,
    pub response: FunctionResponseBody,
}

/// One part of a model-facing message.
///
/// Serialized untagged so the wire shape is `{"text": ...}`,
/// `{"inlineData": ...}` and so on. `Other` catches generic parts the
/// scheduler does not interpret (including the empty object).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    Text {
        text: String,
    },
    Other(Value),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn function_response(
        name: impl Into<String>,
        id: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Part::FunctionResponse {
            function_response: FunctionResponse {
                name: name.into(),
                id: id.into(),
                response: FunctionResponseBody {
                    output: output.into(),
                },
            },
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: Blob {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    pub fn file_data(mime_type: impl Into<String>, file_uri: impl Into<String>) -> Self {
        Part::FileData {
            file_data: FileData {
                mime_type: mime_type.into(),
                file_uri: file_uri.into(),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Mime type of a binary part, `None` for everything else.
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            Part::InlineData { inline_data } => Some(&inline_data.mime_type),
            Part::FileData { file_data } => Some(&file_data.mime_type),
            _ => None,
        }
    }
}

/// What a tool returns for the model to read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToolContent {
    Text(String),
    Part(Part),
    Parts(Vec<Part>),
}

impl From<String> for ToolContent {
    fn from(text: String) -> Self {
        ToolContent::Text(text)
    }
}

impl From<&str> for ToolContent {
    fn from(text: &str) -> Self {
        ToolContent::Text(text.to_string())
    }
}

impl From<Part> for ToolContent {
    fn from(part: Part) -> Self {
        ToolContent::Part(part)
    }
}

impl From<Vec<Part>> for ToolContent {
    fn from(parts: Vec<Part>) -> Self {
        ToolContent::Parts(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_wire_shapes() {
        let text = serde_json::to_value(Part::text("hi")).unwrap();
        assert_eq!(text, serde_json::json!({"text": "hi"}));

        let blob = serde_json::to_value(Part::inline_data("image/png", "AAAA")).unwrap();
        assert_eq!(
            blob,
            serde_json::json!({"inlineData": {"mimeType": "image/png", "data": "AAAA"}})
        );

        let envelope = serde_json::to_value(Part::function_response("t", "c1", "ok")).unwrap();
        assert_eq!(
            envelope,
            serde_json::json!({
                "functionResponse": {"name": "t", "id": "c1", "response": {"output": "ok"}}
            })
        );
    }

    #[test]
    fn generic_part_roundtrips_through_other() {
        let part: Part = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(part, Part::Other(_)));
        assert!(part.as_text().is_none());
        assert!(part.mime_type().is_none());
    }
}
