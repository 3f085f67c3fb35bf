//! OpenAI-compatible chat completions backend.
//!
//! Also serves Ollama, which exposes the same API under `/v1`.

use crate::conversation::Turn;
use crate::model::{
    Completion, ModelClient, ModelError, ModelRequest, ToolCallRequest, ToolDescriptor, Usage,
};
use crate::tools::ToolOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl ApiMessage {
    fn text(role: &'static str, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize)]
struct ApiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ApiFunction,
}

#[derive(Debug, Serialize)]
struct ApiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<ApiResponseFunction>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendBuilder {
    model: String,
    base_url: String,
    api_key: Option<String>,
    max_tokens: Option<u32>,
}

impl OpenAiBackendBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: None,
            max_tokens: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn build(self) -> OpenAiBackend {
        OpenAiBackend {
            client: reqwest::Client::new(),
            model: self.model,
            endpoint: format!("{}/chat/completions", self.base_url.trim_end_matches('/')),
            api_key: self.api_key,
            max_tokens: self.max_tokens,
        }
    }
}

/// OpenAI-compatible backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    max_tokens: Option<u32>,
}

impl OpenAiBackend {
    pub fn builder(model: impl Into<String>) -> OpenAiBackendBuilder {
        OpenAiBackendBuilder::new(model)
    }

    fn turn_to_api(turn: &Turn) -> ApiMessage {
        match turn {
            Turn::System { text } => ApiMessage::text("system", text),
            Turn::User { text } => ApiMessage::text("user", text),
            Turn::Assistant { text, tool_calls } => ApiMessage {
                tool_calls: tool_calls
                    .iter()
                    // Nameless calls never get a result, so they are not echoed back.
                    .filter(|call| !call.is_malformed())
                    .map(|call| ApiToolCall {
                        id: call.call_id.clone(),
                        kind: "function",
                        function: ApiFunctionCall {
                            name: call.tool_name.clone(),
                            arguments: call.raw_arguments.clone(),
                        },
                    })
                    .collect(),
                ..ApiMessage::text("assistant", text)
            },
            Turn::ToolResult(result) => {
                let content = match &result.outcome {
                    ToolOutcome::Success { content } => content.clone(),
                    ToolOutcome::Failure { message } => format!("Error: {message}"),
                };
                ApiMessage {
                    tool_call_id: Some(result.call_id.clone()),
                    name: Some(result.tool_name.clone()),
                    ..ApiMessage::text("tool", &content)
                }
            }
        }
    }

    fn tool_to_api(tool: &ToolDescriptor) -> ApiTool {
        ApiTool {
            kind: "function",
            function: ApiFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        }
    }

    fn response_to_completion(response: ApiResponse) -> Result<Completion, ModelError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("no choices in response".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let call_id = call
                    .id
                    .ok_or_else(|| ModelError::InvalidResponse("tool call without an id".into()))?;
                let (tool_name, raw_arguments) = match call.function {
                    Some(function) => (
                        function.name.unwrap_or_default(),
                        function.arguments.unwrap_or_default(),
                    ),
                    None => (String::new(), String::new()),
                };
                Ok(ToolCallRequest {
                    call_id,
                    tool_name,
                    raw_arguments,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            tool_calls,
            usage,
        })
    }
}

impl std::fmt::Display for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai({}, {})", self.model, self.endpoint)
    }
}

impl ModelClient for OpenAiBackend {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<Completion, ModelError> {
        let api_request = ApiRequest {
            model: &self.model,
            messages: request.turns.iter().map(Self::turn_to_api).collect(),
            tools: request.tools.iter().map(Self::tool_to_api).collect(),
            max_tokens: self.max_tokens,
        };

        let mut req = self.client.post(&self.endpoint).json(&api_request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
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

        Self::response_to_completion(api_response)
    }
}
