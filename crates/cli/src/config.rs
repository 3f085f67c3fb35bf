//! Configuration loading from switchboard.toml.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use runtime::{DuplicatePolicy, Provider, ProviderConfig, ServerConfig, SessionConfig};
use serde::Deserialize;
use tracing::debug;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Model provider settings.
    #[serde(default)]
    pub model: ModelSection,

    /// Conversation loop settings.
    #[serde(default)]
    pub session: SessionSection,

    /// MCP servers by name.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerEntry>,
}

/// `[model]`: every field may also come from the command line or environment.
#[derive(Debug, Default, Deserialize)]
pub struct ModelSection {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    /// Falls back to the provider's key variable, e.g. `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
}

/// `[session]`
#[derive(Debug, Deserialize)]
pub struct SessionSection {
    #[serde(default)]
    pub duplicate_tools: DuplicatePolicy,

    /// Dispatch/follow-up cycles allowed per round.
    #[serde(default = "default_tool_hops")]
    pub tool_hops: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            duplicate_tools: DuplicatePolicy::default(),
            tool_hops: default_tool_hops(),
        }
    }
}

fn default_tool_hops() -> usize {
    1
}

/// `[servers.NAME]`
#[derive(Debug, Clone, Deserialize)]
pub struct ServerEntry {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Settings given on the command line, which win over everything else.
#[derive(Debug, Default)]
pub struct Overrides {
    pub provider: Option<Provider>,
    pub model: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load the file if it exists, otherwise start from defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Servers to connect, in the order asked for. No names means all of them.
    pub fn select_servers(&self, names: &[String]) -> Result<Vec<ServerConfig>, ConfigError> {
        if names.is_empty() {
            return Ok(self
                .servers
                .iter()
                .map(|(name, entry)| entry.to_server_config(name))
                .collect());
        }

        names
            .iter()
            .map(|name| {
                self.servers
                    .get(name)
                    .map(|entry| entry.to_server_config(name))
                    .ok_or_else(|| ConfigError::UnknownServer(name.clone()))
            })
            .collect()
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default().with_tool_hops(self.session.tool_hops)
    }

    /// Resolve provider settings.
    ///
    /// Precedence is command line, then `LLM_PROVIDER`/`LLM_MODEL`, then the
    /// file, then provider defaults. `env` looks up environment variables.
    pub fn resolve_provider(
        &self,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ProviderConfig, ConfigError> {
        let provider = match overrides.provider {
            Some(provider) => provider,
            None => match env("LLM_PROVIDER").filter(|v| !v.trim().is_empty()) {
                Some(value) => value.parse().map_err(ConfigError::InvalidProvider)?,
                None => self.model.provider.unwrap_or_default(),
            },
        };

        let model = overrides
            .model
            .clone()
            .or_else(|| env("LLM_MODEL").filter(|v| !v.trim().is_empty()))
            .or_else(|| self.model.model.clone())
            .unwrap_or_else(|| provider.default_model().to_string());

        let api_key = self
            .model
            .api_key
            .clone()
            .or_else(|| api_key_var(provider).and_then(&env));
        if api_key.is_none() && provider.requires_api_key() {
            return Err(ConfigError::MissingApiKey {
                provider,
                var: api_key_var(provider).unwrap_or_default(),
            });
        }

        Ok(ProviderConfig {
            provider,
            model,
            api_key,
            base_url: self.model.base_url.clone(),
            max_tokens: self.model.max_tokens,
        })
    }
}

impl ServerEntry {
    fn to_server_config(&self, name: &str) -> ServerConfig {
        ServerConfig {
            name: name.to_string(),
            command: self.command.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
        }
    }
}

fn api_key_var(provider: Provider) -> Option<&'static str> {
    match provider {
        Provider::OpenAi => Some("OPENAI_API_KEY"),
        Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
        Provider::Ollama => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("{0}")]
    InvalidProvider(String),

    #[error("no server named '{0}' in config")]
    UnknownServer(String),

    #[error("no API key for {provider}: set model.api_key or {var}")]
    MissingApiKey { provider: Provider, var: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [model]
        provider = "anthropic"
        max_tokens = 2048

        [session]
        duplicate_tools = "keep_first"
        tool_hops = 3

        [servers.sqlite]
        command = "uvx"
        args = ["mcp-server-sqlite", "--db-path", "test.db"]

        [servers.files]
        command = "npx"
        args = ["-y", "@modelcontextprotocol/server-filesystem", "/tmp"]
        env = { DEBUG = "1" }
    "#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_full_config() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.model.provider, Some(Provider::Anthropic));
        assert_eq!(config.model.max_tokens, Some(2048));
        assert_eq!(config.session.duplicate_tools, DuplicatePolicy::KeepFirst);
        assert_eq!(config.session_config().tool_hops, 3);
        assert_eq!(config.servers["files"].env["DEBUG"], "1");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.session.duplicate_tools, DuplicatePolicy::Reject);
        assert_eq!(config.session.tool_hops, 1);
        assert!(config.servers.is_empty());
    }

    #[test]
    fn rejects_unknown_provider() {
        let err = Config::parse("[model]\nprovider = \"gemini\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn selects_named_servers_in_order() {
        let config = Config::parse(SAMPLE).unwrap();
        let servers = config
            .select_servers(&["sqlite".into(), "files".into()])
            .unwrap();
        let names: Vec<_> = servers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["sqlite", "files"]);
        assert_eq!(servers[0].command, "uvx");
        assert_eq!(servers[0].args, ["mcp-server-sqlite", "--db-path", "test.db"]);
    }

    #[test]
    fn no_names_selects_every_server() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.select_servers(&[]).unwrap().len(), 2);
    }

    #[test]
    fn unknown_server_is_an_error() {
        let config = Config::parse(SAMPLE).unwrap();
        let err = config.select_servers(&["postgres".into()]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownServer(name) if name == "postgres"));
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = Config::parse("[model]\nprovider = \"ollama\"").unwrap();
        let resolved = config.resolve_provider(&Overrides::default(), no_env).unwrap();
        assert_eq!(resolved.provider, Provider::Ollama);
        assert_eq!(resolved.model, "llama3.2");
        assert_eq!(resolved.api_key, None);
    }

    #[test]
    fn missing_key_names_the_variable() {
        let config = Config::default();
        let err = config
            .resolve_provider(&Overrides::default(), no_env)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "no API key for openai: set model.api_key or OPENAI_API_KEY"
        );
    }

    #[test]
    fn environment_overrides_file() {
        let config = Config::parse(SAMPLE).unwrap();
        let env = |key: &str| match key {
            "LLM_PROVIDER" => Some("openai".to_string()),
            "LLM_MODEL" => Some("gpt-4o".to_string()),
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            _ => None,
        };
        let resolved = config.resolve_provider(&Overrides::default(), env).unwrap();
        assert_eq!(resolved.provider, Provider::OpenAi);
        assert_eq!(resolved.model, "gpt-4o");
        assert_eq!(resolved.api_key.as_deref(), Some("sk-test"));
        assert_eq!(resolved.max_tokens, Some(2048));
    }

    #[test]
    fn command_line_overrides_environment() {
        let config = Config::default();
        let overrides = Overrides {
            provider: Some(Provider::Ollama),
            model: Some("qwen2.5".into()),
        };
        let env = |key: &str| match key {
            "LLM_PROVIDER" => Some("anthropic".to_string()),
            "LLM_MODEL" => Some("claude-sonnet-4-20250514".to_string()),
            _ => None,
        };
        let resolved = config.resolve_provider(&overrides, env).unwrap();
        assert_eq!(resolved.provider, Provider::Ollama);
        assert_eq!(resolved.model, "qwen2.5");
    }

    #[test]
    fn bad_provider_in_environment() {
        let env = |key: &str| (key == "LLM_PROVIDER").then(|| "gemini".to_string());
        let err = Config::default()
            .resolve_provider(&Overrides::default(), env)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProvider(_)));
    }
}
