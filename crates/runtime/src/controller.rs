//! The tool-augmented conversation loop.

use std::fmt;
use std::future::Future;
use std::io;

use tracing::{debug, info, warn};

use crate::conversation::{Conversation, Turn};
use crate::model::{Completion, ModelClient, ModelRequest, ToolCallRequest};
use crate::tools::{Dispatcher, Registry, ToolBackend, ToolCallResult};
use crate::Result;

const EXIT_KEYWORDS: [&str; 2] = ["exit", "quit"];
const ACKNOWLEDGEMENT: &str = "I'll help you with that.";
const EMPTY_RESPONSE: &str = "No response";
const EMPTY_FOLLOWUP: &str = "I processed the tool responses but have nothing specific to add.";

/// Knobs for one chat session, resolved before the loop starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Inputs that end the session, compared case-insensitively.
    pub exit_keywords: Vec<String>,
    /// How many dispatch/follow-up cycles one round may run. At least 1.
    pub tool_hops: usize,
    /// Assistant text stored when a tool-requesting completion has none.
    pub acknowledgement: String,
    /// Answer used when a completion without tool calls has no text.
    pub empty_response: String,
    /// Answer used when a follow-up completion has no text.
    pub empty_followup: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            exit_keywords: EXIT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            tool_hops: 1,
            acknowledgement: ACKNOWLEDGEMENT.to_string(),
            empty_response: EMPTY_RESPONSE.to_string(),
            empty_followup: EMPTY_FOLLOWUP.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn with_tool_hops(mut self, hops: usize) -> Self {
        self.tool_hops = hops.max(1);
        self
    }

    pub fn is_exit(&self, input: &str) -> bool {
        let input = input.trim();
        self.exit_keywords
            .iter()
            .any(|keyword| keyword.eq_ignore_ascii_case(input))
    }
}

/// Where the controller is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingUserInput,
    RequestingCompletion,
    DispatchingTools,
    RequestingFollowup,
    SessionEnded,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingUserInput => "awaiting_user_input",
            Self::RequestingCompletion => "requesting_completion",
            Self::DispatchingTools => "dispatching_tools",
            Self::RequestingFollowup => "requesting_followup",
            Self::SessionEnded => "session_ended",
        };
        f.write_str(name)
    }
}

/// The operator-facing side of a session.
pub trait Surface: Send {
    /// Next line of user input, or `None` once input is exhausted.
    fn read_input(&mut self) -> impl Future<Output = io::Result<Option<String>>> + Send;

    /// The trimmed input about to start a round. May be empty.
    fn user(&mut self, text: &str);

    fn tool_invocation(&mut self, request: &ToolCallRequest);

    fn tool_response(&mut self, result: &ToolCallResult);

    /// The one rendered answer of a round.
    fn answer(&mut self, text: &str);

    fn error(&mut self, message: &str);

    fn goodbye(&mut self);
}

/// Drives rounds of user input, completions and tool dispatch.
///
/// Owns the conversation; the model, the dispatcher and the surface only
/// hand data back for the controller to append.
pub struct TurnController<M, B, S> {
    model: M,
    dispatcher: Dispatcher<B>,
    surface: S,
    conversation: Conversation,
    config: SessionConfig,
    state: SessionState,
}

impl<M, B, S> TurnController<M, B, S>
where
    M: ModelClient,
    B: ToolBackend,
    S: Surface,
{
    pub fn new(
        model: M,
        registry: Registry<B>,
        surface: S,
        system_prompt: impl Into<String>,
        config: SessionConfig,
    ) -> Self {
        Self {
            model,
            dispatcher: Dispatcher::new(registry),
            surface,
            conversation: Conversation::new(system_prompt),
            config,
            state: SessionState::AwaitingUserInput,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn registry(&self) -> &Registry<B> {
        self.dispatcher.registry()
    }

    /// Run rounds until the user exits or input ends.
    ///
    /// Recoverable round failures are shown and the loop goes on; anything
    /// else is returned.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.transition(SessionState::AwaitingUserInput);
            let Some(line) = self.surface.read_input().await? else {
                debug!("input closed");
                break;
            };

            let input = line.trim();
            if self.config.is_exit(input) {
                break;
            }
            self.surface.user(input);

            match self.round(input).await {
                Ok(answer) => self.surface.answer(&answer),
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "round failed");
                    self.surface.error(&e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        self.transition(SessionState::SessionEnded);
        info!(turns = self.conversation.len(), "session ended");
        self.surface.goodbye();
        Ok(())
    }

    /// One user input through to the round's final answer.
    ///
    /// The answer has already been appended to the conversation when this
    /// returns.
    pub async fn round(&mut self, input: &str) -> Result<String> {
        self.conversation.push(Turn::user(input));
        self.transition(SessionState::RequestingCompletion);
        let mut completion = self.complete().await?;
        let mut hops = 0;

        loop {
            let Completion {
                text, tool_calls, ..
            } = completion;

            if tool_calls.is_empty() {
                let fallback = if hops == 0 {
                    &self.config.empty_response
                } else {
                    &self.config.empty_followup
                };
                let answer = or_default(text, fallback);
                self.conversation.push(Turn::assistant(answer.clone()));
                return Ok(answer);
            }

            if hops >= self.config.tool_hops {
                warn!(
                    ignored = tool_calls.len(),
                    "follow-up requested more tools than the hop budget allows"
                );
                let answer = or_default(text, &self.config.empty_followup);
                self.conversation.push(Turn::assistant(answer.clone()));
                return Ok(answer);
            }

            let text = or_default(text, &self.config.acknowledgement);
            self.conversation.push(Turn::Assistant {
                text,
                tool_calls: tool_calls.clone(),
            });

            self.transition(SessionState::DispatchingTools);
            self.dispatch_all(&tool_calls).await;
            hops += 1;

            self.transition(SessionState::RequestingFollowup);
            completion = self.complete().await?;
        }
    }

    /// Dispatch in request order, appending each result before the next call.
    async fn dispatch_all(&mut self, calls: &[ToolCallRequest]) {
        for request in calls {
            if request.is_malformed() {
                warn!(call_id = %request.call_id, "skipping tool call without a name");
                continue;
            }

            self.surface.tool_invocation(request);
            let result = self.dispatcher.invoke(request).await;
            self.surface.tool_response(&result);
            self.conversation.push(Turn::ToolResult(result));
        }
    }

    async fn complete(&self) -> Result<Completion> {
        let request = ModelRequest {
            turns: self.conversation.turns(),
            tools: self.dispatcher.registry().schema(),
        };
        let completion = self.model.complete(request).await?;
        debug!(
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            tool_calls = completion.tool_calls.len(),
            "completion received"
        );
        Ok(completion)
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "state transition");
            self.state = next;
        }
    }
}

fn or_default(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_keywords_ignore_case_and_padding() {
        let config = SessionConfig::default();
        assert!(config.is_exit("quit"));
        assert!(config.is_exit("  EXIT "));
        assert!(config.is_exit("Quit"));
        assert!(!config.is_exit("quit now"));
        assert!(!config.is_exit(""));
    }

    #[test]
    fn tool_hops_never_drop_below_one() {
        assert_eq!(SessionConfig::default().with_tool_hops(0).tool_hops, 1);
        assert_eq!(SessionConfig::default().with_tool_hops(3).tool_hops, 3);
    }

    #[test]
    fn empty_text_falls_back() {
        assert_eq!(or_default(String::new(), "No response"), "No response");
        assert_eq!(or_default(" \n".into(), "No response"), "No response");
        assert_eq!(or_default("4".into(), "No response"), "4");
    }

    #[test]
    fn state_names() {
        assert_eq!(SessionState::DispatchingTools.to_string(), "dispatching_tools");
        assert_eq!(SessionState::SessionEnded.to_string(), "session_ended");
    }
}
