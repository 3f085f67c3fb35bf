use thiserror::Error;

use crate::model::ModelError;

/// Session-level errors.
///
/// Per-call tool failures never show up here; they become tool results.
/// Backend start-up and listing failures are handled where they happen.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Discovery finished without a single usable tool.
    #[error("no tools available from any server")]
    NoToolsAvailable,

    /// Two backends expose the same tool name under `DuplicatePolicy::Reject`.
    #[error("tool '{name}' is provided by both '{first}' and '{second}'")]
    DuplicateTool {
        name: String,
        first: String,
        second: String,
    },

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("console error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the conversation loop may carry on with the next round.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Model(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_model_errors_are_recoverable() {
        assert!(Error::Model(ModelError::Network("reset".into())).is_recoverable());
        assert!(!Error::NoToolsAvailable.is_recoverable());
        assert!(!Error::Io(std::io::Error::other("closed")).is_recoverable());
    }

    #[test]
    fn session_errors_name_their_cause() {
        let duplicate = Error::DuplicateTool {
            name: "add".into(),
            first: "math".into(),
            second: "calc".into(),
        };
        assert_eq!(
            duplicate.to_string(),
            "tool 'add' is provided by both 'math' and 'calc'"
        );
        let model: Error = ModelError::Api("429 Too Many Requests".into()).into();
        assert_eq!(model.to_string(), "model error: provider api: 429 Too Many Requests");
    }
}
