//! Workflow provider trait for the chat widget

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

/// JSON pointer to the assistant text in a flow run response
pub const ANSWER_POINTER: &str = "/outputs/0/outputs/0/results/message/text";

/// Trait for hosted workflows that answer a single chat message
///
/// Implementations:
/// - `LangflowClient`: Langflow run API
#[async_trait]
pub trait WorkflowClient: Send + Sync {
    /// Run the flow on one user message and return the raw JSON response
    async fn run(&self, message: &str) -> Result<Value>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Pull the assistant text out of a flow run response
pub fn extract_answer(response: &Value) -> Result<String> {
    response
        .pointer(ANSWER_POINTER)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::MissingField("outputs[0].outputs[0].results.message.text".to_string()))
}
