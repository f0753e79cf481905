use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque JSON schema describing a tool's parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputSchema(Value);

impl InputSchema {
    pub fn new(schema: Value) -> Self {
        Self(schema)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn object(properties: serde_json::Map<String, Value>, required: Vec<String>) -> Self {
        let mut schema = serde_json::Map::new();
        schema.insert("type".to_string(), Value::String("object".to_string()));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            let required_values = required.into_iter().map(Value::String).collect::<Vec<_>>();
            schema.insert("required".to_string(), Value::Array(required_values));
        }
        Self(Value::Object(schema))
    }

    pub fn empty_object() -> Self {
        Self::object(Default::default(), Vec::new())
    }
}

impl From<Value> for InputSchema {
    fn from(schema: Value) -> Self {
        Self(schema)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

/// A single tool-call request issued by the orchestrator.
///
/// `call_id` is unique within one scheduled batch; `prompt_id` groups the
/// requests that came out of one model turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRequest {
    pub call_id: String,
    pub name: String,
    pub args: Value,
    /// True when the request was synthesized by the client rather than the model.
    #[serde(default)]
    pub is_client_initiated: bool,
    pub prompt_id: String,
}

impl ToolCallRequest {
    pub fn new(
        call_id: impl Into<String>,
        name: impl Into<String>,
        args: Value,
        prompt_id: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            name: name.into(),
            args,
            is_client_initiated: false,
            prompt_id: prompt_id.into(),
        }
    }
}
