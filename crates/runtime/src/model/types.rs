//! Core model types (provider-agnostic).
//!
//! Provider wire formats live in `crate::providers`; everything here is what
//! the turn controller sees.

use super::errors::ModelError;
use crate::conversation::Turn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// A tool definition advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within a registry.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the accepted arguments.
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Identifier unique within the emitting assistant turn.
    pub call_id: String,
    /// Requested tool. Empty when the provider omitted it.
    pub tool_name: String,
    /// Arguments exactly as the model produced them, not yet validated.
    pub raw_arguments: String,
}

impl ToolCallRequest {
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        raw_arguments: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            raw_arguments: raw_arguments.into(),
        }
    }

    /// A request without a tool name cannot be routed anywhere.
    pub fn is_malformed(&self) -> bool {
        self.tool_name.trim().is_empty()
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Everything needed for a completion request.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub turns: &'a [Turn],
    pub tools: &'a [ToolDescriptor],
}

/// What the model answered: text, requested tool calls, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: Usage,
}

impl Completion {
    /// A plain text answer.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_tool_call(mut self, call: ToolCallRequest) -> Self {
        self.tool_calls.push(call);
        self
    }
}

/// Trait for language model providers.
///
/// Implementations must tolerate being called several times per round with a
/// history that only ever grows.
pub trait ModelClient: Send + Sync {
    fn complete(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<Completion, ModelError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nameless_request_is_malformed() {
        assert!(ToolCallRequest::new("1", "", "{}").is_malformed());
        assert!(ToolCallRequest::new("1", "  ", "{}").is_malformed());
        assert!(!ToolCallRequest::new("1", "add", "").is_malformed());
    }

    #[test]
    fn completion_builder() {
        let completion =
            Completion::text("checking").with_tool_call(ToolCallRequest::new("c1", "add", "{}"));
        assert_eq!(completion.text, "checking");
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].tool_name, "add");
    }

    #[test]
    fn usage_total_tokens() {
        let usage = Usage {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(usage.total_tokens(), 150);
    }
}
