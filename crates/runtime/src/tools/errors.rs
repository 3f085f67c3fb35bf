use thiserror::Error;

/// Per-call failures. Each one becomes a tool result the model can read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// No backend registered the requested name.
    #[error("tool not found")]
    UnknownTool(String),

    /// The model's arguments were not a JSON object. The backend is not called.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The backend ran the tool and flagged the result as an error.
    #[error("{0}")]
    Backend(String),

    /// The call could not be completed.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Failures talking to a tool backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to connect to server '{server}': {message}")]
    Connect { server: String, message: String },

    #[error("request to server '{server}' failed: {message}")]
    Request { server: String, message: String },
}
