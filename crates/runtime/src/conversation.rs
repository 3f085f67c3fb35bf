//! The conversation log.

use crate::model::ToolCallRequest;
use crate::tools::ToolCallResult;
use serde::{Deserialize, Serialize};

/// Role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    System {
        text: String,
    },
    User {
        text: String,
    },
    /// Model output, together with the tool calls it asked for in the same
    /// completion. Providers need that link when they are later shown the
    /// results.
    Assistant {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    ToolResult(ToolCallResult),
}

impl Turn {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System { text: text.into() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::ToolResult(_) => Role::Tool,
        }
    }

    /// Text carried by this turn. Tool results yield their content or error
    /// message.
    pub fn text(&self) -> &str {
        match self {
            Self::System { text } | Self::User { text } | Self::Assistant { text, .. } => text,
            Self::ToolResult(result) => result.outcome.text(),
        }
    }
}

/// Ordered, append-only log of turns.
///
/// Insertion order is chronological order. Turns are never edited or
/// reordered once pushed.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Start a conversation with its system preamble.
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system)],
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Owned copy of the log as it is now.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolOutcome;

    #[test]
    fn starts_with_system_turn() {
        let conversation = Conversation::new("be brief");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turns()[0].role(), Role::System);
        assert_eq!(conversation.turns()[0].text(), "be brief");
    }

    #[test]
    fn snapshot_is_not_affected_by_later_pushes() {
        let mut conversation = Conversation::new("sys");
        conversation.push(Turn::user("hi"));
        let snapshot = conversation.snapshot();

        conversation.push(Turn::assistant("hello"));
        conversation.push(Turn::user("again"));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1], Turn::user("hi"));
        assert_eq!(conversation.len(), 4);
        assert_eq!(&conversation.turns()[..2], snapshot.as_slice());
    }

    #[test]
    fn tool_result_text_is_outcome_text() {
        let turn = Turn::ToolResult(ToolCallResult {
            call_id: "c1".into(),
            tool_name: "subtract".into(),
            outcome: ToolOutcome::failure("tool not found"),
        });
        assert_eq!(turn.role(), Role::Tool);
        assert_eq!(turn.text(), "tool not found");
    }

    #[test]
    fn assistant_turn_serializes_tool_calls() {
        let turn = Turn::Assistant {
            text: "on it".into(),
            tool_calls: vec![ToolCallRequest::new("c1", "add", r#"{"a":1}"#)],
        };
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["tool_calls"][0]["tool_name"], "add");
    }
}
