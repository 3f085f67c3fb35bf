//! LLM provider adapters.
//!
//! Each provider implements [`ModelClient`] for its wire format.
//! [`ProviderClient`] picks one at runtime from a [`ProviderConfig`].

mod anthropic;
mod openai;

pub use anthropic::{ANTHROPIC_BASE_URL, AnthropicBackend, AnthropicBackendBuilder};
pub use openai::{OPENAI_BASE_URL, OpenAiBackend, OpenAiBackendBuilder};

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::model::{Completion, ModelClient, ModelError, ModelRequest};

pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Which API family to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Ollama,
    Anthropic,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Ollama => "llama3.2",
            Self::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => OPENAI_BASE_URL,
            Self::Ollama => OLLAMA_BASE_URL,
            Self::Anthropic => ANTHROPIC_BASE_URL,
        }
    }

    /// Whether requests are refused without a key.
    pub fn requires_api_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Anthropic => "anthropic",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(format!(
                "unknown provider '{other}' (expected openai, ollama or anthropic)"
            )),
        }
    }
}

/// Fully resolved provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
}

impl ProviderConfig {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            base_url: None,
            max_tokens: None,
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }
}

/// A model client for whichever provider was configured.
pub enum ProviderClient {
    OpenAi(OpenAiBackend),
    Anthropic(AnthropicBackend),
}

impl ProviderClient {
    pub fn new(config: &ProviderConfig) -> Self {
        match config.provider {
            Provider::OpenAi | Provider::Ollama => {
                let mut builder = OpenAiBackend::builder(&config.model).base_url(config.base_url());
                if let Some(key) = &config.api_key {
                    builder = builder.api_key(key);
                }
                if let Some(max_tokens) = config.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }
                Self::OpenAi(builder.build())
            }
            Provider::Anthropic => {
                let key = config.api_key.clone().unwrap_or_default();
                let mut builder =
                    AnthropicBackend::builder(key, &config.model).base_url(config.base_url());
                if let Some(max_tokens) = config.max_tokens {
                    builder = builder.max_tokens(max_tokens);
                }
                Self::Anthropic(builder.build())
            }
        }
    }
}

impl fmt::Display for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi(backend) => write!(f, "{backend}"),
            Self::Anthropic(backend) => write!(f, "{backend}"),
        }
    }
}

impl ModelClient for ProviderClient {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<Completion, ModelError> {
        match self {
            Self::OpenAi(backend) => backend.complete(request).await,
            Self::Anthropic(backend) => backend.complete(request).await,
        }
    }
}
