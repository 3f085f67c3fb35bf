//! Anthropic Messages API backend.

use crate::conversation::Turn;
use crate::model::{
    Completion, ModelClient, ModelError, ModelRequest, ToolCallRequest, ToolDescriptor, Usage,
};
use crate::tools::ToolOutcome;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Sent in place of blank user input, which the Messages API refuses.
const EMPTY_USER_TEXT: &str = "[No Message]";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: ApiContent,
}

impl ApiMessage {
    /// The blocks of a user message made only of tool results.
    fn tool_results_mut(&mut self) -> Option<&mut Vec<ApiContentBlock>> {
        match self {
            ApiMessage {
                role: "user",
                content: ApiContent::Blocks(blocks),
            } if blocks
                .iter()
                .all(|b| matches!(b, ApiContentBlock::ToolResult { .. })) =>
            {
                Some(blocks)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Blocks(Vec<ApiContentBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiResponseBlock>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicBackendBuilder {
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl AnthropicBackendBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn build(self) -> AnthropicBackend {
        AnthropicBackend {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
            endpoint: format!("{}/messages", self.base_url.trim_end_matches('/')),
            max_tokens: self.max_tokens,
        }
    }
}

/// Anthropic API backend.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_tokens: u32,
}

impl AnthropicBackend {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> AnthropicBackendBuilder {
        AnthropicBackendBuilder::new(api_key, model)
    }

    /// System turns, joined. The Messages API takes them outside the list.
    fn system_prompt(turns: &[Turn]) -> Option<String> {
        let parts: Vec<&str> = turns
            .iter()
            .filter_map(|turn| match turn {
                Turn::System { text } if !text.is_empty() => Some(text.as_str()),
                _ => None,
            })
            .collect();
        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }

    fn turns_to_api(turns: &[Turn]) -> Vec<ApiMessage> {
        let mut messages: Vec<ApiMessage> = Vec::new();

        for turn in turns {
            match turn {
                Turn::System { .. } => {}
                Turn::User { text } => {
                    let text = if text.trim().is_empty() {
                        EMPTY_USER_TEXT.to_string()
                    } else {
                        text.clone()
                    };
                    messages.push(ApiMessage {
                        role: "user",
                        content: ApiContent::Text(text),
                    });
                }
                Turn::Assistant { text, tool_calls } => {
                    let mut blocks = Vec::new();
                    if !text.is_empty() {
                        blocks.push(ApiContentBlock::Text { text: text.clone() });
                    }
                    blocks.extend(
                        tool_calls
                            .iter()
                            .filter(|call| !call.is_malformed())
                            .map(|call| ApiContentBlock::ToolUse {
                                id: call.call_id.clone(),
                                name: call.tool_name.clone(),
                                input: Value::Object(input_object(&call.raw_arguments)),
                            }),
                    );
                    messages.push(ApiMessage {
                        role: "assistant",
                        content: ApiContent::Blocks(blocks),
                    });
                }
                Turn::ToolResult(result) => {
                    let (content, is_error) = match &result.outcome {
                        ToolOutcome::Success { content } => (content.clone(), false),
                        ToolOutcome::Failure { message } => (message.clone(), true),
                    };
                    let block = ApiContentBlock::ToolResult {
                        tool_use_id: result.call_id.clone(),
                        content,
                        is_error,
                    };

                    // All results answering one assistant turn travel in a
                    // single user message.
                    if let Some(blocks) = messages.last_mut().and_then(ApiMessage::tool_results_mut) {
                        blocks.push(block);
                    } else {
                        messages.push(ApiMessage {
                            role: "user",
                            content: ApiContent::Blocks(vec![block]),
                        });
                    }
                }
            }
        }

        messages
    }

    fn tool_to_api(tool: &ToolDescriptor) -> ApiTool {
        ApiTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: tool.input_schema.clone(),
        }
    }

    fn response_to_completion(response: ApiResponse) -> Completion {
        let mut text = Vec::new();
        let mut tool_calls = Vec::new();

        for block in response.content {
            match block {
                ApiResponseBlock::Text { text: t } => text.push(t),
                ApiResponseBlock::ToolUse { id, name, input } => {
                    let raw_arguments = match input {
                        Value::Null => String::new(),
                        input => input.to_string(),
                    };
                    tool_calls.push(ToolCallRequest {
                        call_id: id,
                        tool_name: name,
                        raw_arguments,
                    });
                }
                ApiResponseBlock::Unknown => {}
            }
        }

        Completion {
            text: text.join("\n"),
            tool_calls,
            usage: Usage {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
            },
        }
    }
}

/// The wire format needs an object; anything else goes over as `{}`.
fn input_object(raw: &str) -> Map<String, Value> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

impl std::fmt::Display for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anthropic({})", self.model)
    }
}

impl ModelClient for AnthropicBackend {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<Completion, ModelError> {
        let api_request = ApiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: Self::turns_to_api(request.turns),
            system: Self::system_prompt(request.turns),
            tools: request.tools.iter().map(Self::tool_to_api).collect(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("accept", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        Ok(Self::response_to_completion(api_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolCallResult;
    use serde_json::json;

    fn result(call_id: &str, outcome: ToolOutcome) -> Turn {
        Turn::ToolResult(ToolCallResult {
            call_id: call_id.into(),
            tool_name: "add".into(),
            outcome,
        })
    }

    #[test]
    fn system_turns_leave_the_message_list() {
        let turns = vec![Turn::system("You are helpful."), Turn::user("hi")];
        assert_eq!(
            AnthropicBackend::system_prompt(&turns).as_deref(),
            Some("You are helpful.")
        );
        let messages = serde_json::to_value(AnthropicBackend::turns_to_api(&turns)).unwrap();
        assert_eq!(messages, json!([{"role": "user", "content": "hi"}]));
    }

    #[test]
    fn blank_user_text_gets_a_placeholder() {
        let turns = vec![
            Turn::system("You are helpful."),
            Turn::user(""),
            Turn::assistant("No response"),
            Turn::user("  "),
            Turn::assistant("No response"),
            Turn::user("next question"),
        ];

        let messages = serde_json::to_value(AnthropicBackend::turns_to_api(&turns)).unwrap();
        assert_eq!(messages[0], json!({"role": "user", "content": "[No Message]"}));
        assert_eq!(messages[2], json!({"role": "user", "content": "[No Message]"}));
        assert_eq!(messages[4], json!({"role": "user", "content": "next question"}));
        assert_eq!(turns[1], Turn::user(""));
    }

    #[test]
    fn tool_round_maps_to_tool_use_and_merged_results() {
        let turns = vec![
            Turn::user("add 2 and 2, then subtract 1"),
            Turn::Assistant {
                text: "I'll help you with that.".into(),
                tool_calls: vec![
                    ToolCallRequest::new("toolu_1", "add", r#"{"a":2,"b":2}"#),
                    ToolCallRequest::new("toolu_2", "subtract", ""),
                    ToolCallRequest::new("toolu_3", "", "{}"),
                ],
            },
            result("toolu_1", ToolOutcome::success("4")),
            result("toolu_2", ToolOutcome::failure("tool not found")),
        ];

        let messages = serde_json::to_value(AnthropicBackend::turns_to_api(&turns)).unwrap();
        assert_eq!(
            messages,
            json!([
                {"role": "user", "content": "add 2 and 2, then subtract 1"},
                {"role": "assistant", "content": [
                    {"type": "text", "text": "I'll help you with that."},
                    {"type": "tool_use", "id": "toolu_1", "name": "add", "input": {"a": 2, "b": 2}},
                    {"type": "tool_use", "id": "toolu_2", "name": "subtract", "input": {}}
                ]},
                {"role": "user", "content": [
                    {"type": "tool_result", "tool_use_id": "toolu_1", "content": "4"},
                    {"type": "tool_result", "tool_use_id": "toolu_2", "content": "tool not found", "is_error": true}
                ]}
            ])
        );
    }

    #[test]
    fn response_blocks_become_completion() {
        let response: ApiResponse = serde_json::from_value(json!({
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Let me add those."},
                {"type": "tool_use", "id": "toolu_1", "name": "add", "input": {"a": 2, "b": 2}}
            ],
            "usage": {"input_tokens": 20, "output_tokens": 8}
        }))
        .unwrap();

        let completion = AnthropicBackend::response_to_completion(response);
        assert_eq!(completion.text, "Let me add those.");
        assert_eq!(
            completion.tool_calls,
            vec![ToolCallRequest::new("toolu_1", "add", r#"{"a":2,"b":2}"#)]
        );
        assert_eq!(completion.usage.total_tokens(), 28);
    }

    #[test]
    fn non_object_arguments_go_over_as_empty_input() {
        assert!(input_object("[1, 2]").is_empty());
        assert!(input_object("").is_empty());
        assert_eq!(input_object(r#"{"q":1}"#)["q"], 1);
    }

    #[test]
    fn display_names_model() {
        let backend = AnthropicBackend::builder("key", "claude-sonnet-4-20250514").build();
        assert_eq!(backend.to_string(), "anthropic(claude-sonnet-4-20250514)");
    }
}
