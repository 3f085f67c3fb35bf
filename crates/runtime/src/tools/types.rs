//! Tool-related types.

use serde::{Deserialize, Serialize};

/// What a backend reported for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOutcome {
    /// The backend's own application-level error flag.
    pub is_error: bool,
    pub content: String,
    pub error: Option<String>,
}

impl CallOutcome {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            is_error: false,
            content: content.into(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: String::new(),
            error: Some(message.into()),
        }
    }
}

/// Outcome of one dispatched call, as the model will see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { content: String },
    Failure { message: String },
}

impl ToolOutcome {
    pub fn success(content: impl Into<String>) -> Self {
        Self::Success {
            content: content.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Content on success, message on failure.
    pub fn text(&self) -> &str {
        match self {
            Self::Success { content } => content,
            Self::Failure { message } => message,
        }
    }
}

/// Result of a dispatched call, paired with the request it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub call_id: String,
    pub tool_name: String,
    pub outcome: ToolOutcome,
}
