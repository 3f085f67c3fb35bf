//! Invocation dispatcher.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::model::ToolCallRequest;
use crate::tools::{Registry, ToolBackend, ToolCallResult, ToolError, ToolOutcome};

/// Substituted when a backend flags an error without saying why.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Substituted when a backend succeeds with empty content.
pub const NO_RESPONSE: &str = "No response from tool";

/// Turns requested tool calls into result records.
///
/// Never touches conversation state; the caller decides where results go.
pub struct Dispatcher<B> {
    registry: Registry<B>,
}

impl<B: ToolBackend> Dispatcher<B> {
    pub fn new(registry: Registry<B>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry<B> {
        &self.registry
    }

    /// Run one requested call. Every failure is folded into the outcome.
    pub async fn invoke(&self, request: &ToolCallRequest) -> ToolCallResult {
        let outcome = match self.try_invoke(request).await {
            Ok(content) => {
                debug!(tool = %request.tool_name, call_id = %request.call_id, "tool call succeeded");
                ToolOutcome::success(content)
            }
            Err(e) => {
                warn!(tool = %request.tool_name, call_id = %request.call_id, error = %e, "tool call failed");
                ToolOutcome::failure(e.to_string())
            }
        };

        ToolCallResult {
            call_id: request.call_id.clone(),
            tool_name: request.tool_name.clone(),
            outcome,
        }
    }

    async fn try_invoke(&self, request: &ToolCallRequest) -> Result<String, ToolError> {
        let backend = self.registry.resolve(&request.tool_name)?;
        let arguments = parse_arguments(&request.raw_arguments)?;

        let outcome = backend
            .call_tool(&request.tool_name, arguments)
            .await
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        if outcome.is_error {
            let message = outcome
                .error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            return Err(ToolError::Backend(message));
        }

        if outcome.content.trim().is_empty() {
            return Ok(NO_RESPONSE.to_string());
        }
        Ok(outcome.content)
    }
}

/// Parse model-supplied arguments. Blank input means no arguments.
pub fn parse_arguments(raw: &str) -> Result<Map<String, Value>, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ToolError::InvalidArguments(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ToolError::InvalidArguments(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
