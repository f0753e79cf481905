pub mod confirmation;
pub mod content;
pub mod error;
pub mod invocation;
pub mod result;
pub mod schema;

pub use confirmation::{ConfirmationOutcome, ConfirmationPayload, ConfirmationRequest};
pub use content::{Blob, FileData, FunctionResponse, Part, ToolContent};
pub use error::ToolError;
pub use invocation::{
    DeclarativeTool, LiveOutput, LiveOutputChunk, ModifiableTool, ToolInvocation, ToolKind,
};
pub use result::{FileDiff, ResultDisplay, ToolResult};
pub use schema::{InputSchema, ToolCallRequest, ToolSchema};
