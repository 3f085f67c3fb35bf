//! MCP-backed tool backend.
//!
//! Spawns an MCP server as a child process and talks to it over stdio using
//! the rmcp SDK.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{McpBackend, ServerConfig, ToolBackend};
//!
//! # async fn example() -> Result<(), runtime::BackendError> {
//! let backend = McpBackend::spawn(ServerConfig::new("sqlite", "uvx")
//!     .arg("mcp-server-sqlite")
//!     .arg("--db-path")
//!     .arg("test.db"))
//!     .await?;
//!
//! for tool in backend.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use rmcp::{
    ServiceExt,
    model::{CallToolRequestParams, CallToolResult, Content, Tool},
    service::{RoleClient, RunningService},
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::{debug, info};

use super::{BackendError, CallOutcome, ToolBackend};
use crate::model::ToolDescriptor;

/// How to launch one MCP server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// A connected MCP server.
///
/// The child process is cancelled when this value is dropped.
pub struct McpBackend {
    name: String,
    service: RunningService<RoleClient, ()>,
}

impl McpBackend {
    /// Spawn the server and complete the MCP handshake.
    pub async fn spawn(config: ServerConfig) -> Result<Self, BackendError> {
        let ServerConfig {
            name,
            command,
            args,
            env,
        } = config;

        let connect_error = |message: String| BackendError::Connect {
            server: name.clone(),
            message,
        };

        let transport = TokioChildProcess::new(Command::new(&command).configure(|cmd| {
            cmd.args(&args).envs(&env);
        }))
        .map_err(|e| connect_error(e.to_string()))?;

        let service = ().serve(transport).await.map_err(|e| connect_error(e.to_string()))?;
        info!(server = %name, command = %command, "connected to MCP server");

        Ok(Self { name, service })
    }

    fn request_error(&self, message: impl ToString) -> BackendError {
        BackendError::Request {
            server: self.name.clone(),
            message: message.to_string(),
        }
    }
}

impl ToolBackend for McpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, BackendError> {
        let response = self
            .service
            .list_tools(Default::default())
            .await
            .map_err(|e| self.request_error(e))?;
        Ok(response.tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallOutcome, BackendError> {
        debug!(server = %self.name, tool = name, "calling tool");
        let params = CallToolRequestParams {
            name: name.to_string().into(),
            arguments: Some(arguments),
            meta: None,
            task: None,
        };

        let result = self
            .service
            .call_tool(params)
            .await
            .map_err(|e| self.request_error(e))?;
        Ok(CallOutcome::from(result))
    }
}

impl From<Tool> for ToolDescriptor {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
            input_schema: Value::Object(tool.input_schema.as_ref().clone()),
        }
    }
}

impl From<CallToolResult> for CallOutcome {
    fn from(result: CallToolResult) -> Self {
        let mut content = join_content(&result.content);
        if content.is_empty() {
            if let Some(structured) = &result.structured_content {
                content = structured.to_string();
            }
        }

        if result.is_error.unwrap_or(false) {
            Self {
                is_error: true,
                error: Some(content),
                content: String::new(),
            }
        } else {
            Self::success(content)
        }
    }
}

/// Text blocks verbatim, anything else as JSON, one block per line.
fn join_content(blocks: &[Content]) -> String {
    blocks
        .iter()
        .map(|block| match block.raw.as_text() {
            Some(text) => text.text.clone(),
            None => serde_json::to_string(&block.raw).unwrap_or_default(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_config_builder() {
        let config = ServerConfig::new("sqlite", "uvx")
            .arg("mcp-server-sqlite")
            .arg("--db-path")
            .arg("test.db")
            .env("LOG", "1");
        assert_eq!(config.name, "sqlite");
        assert_eq!(config.args, ["mcp-server-sqlite", "--db-path", "test.db"]);
        assert_eq!(config.env.get("LOG").map(String::as_str), Some("1"));
    }

    #[test]
    fn text_content_is_joined() {
        let result = CallToolResult::success(vec![Content::text("4"), Content::text("done")]);
        let outcome = CallOutcome::from(result);
        assert!(!outcome.is_error);
        assert_eq!(outcome.content, "4\ndone");
    }

    #[test]
    fn error_result_moves_text_into_error() {
        let result = CallToolResult::error(vec![Content::text("no such table: users")]);
        let outcome = CallOutcome::from(result);
        assert!(outcome.is_error);
        assert_eq!(outcome.error.as_deref(), Some("no such table: users"));
        assert!(outcome.content.is_empty());
    }

    #[test]
    fn descriptor_from_mcp_tool() {
        let tool: Tool = serde_json::from_value(json!({
            "name": "read_query",
            "description": "Run a SELECT query",
            "inputSchema": {"type": "object", "properties": {"query": {"type": "string"}}}
        }))
        .unwrap();
        let descriptor = ToolDescriptor::from(tool);
        assert_eq!(descriptor.name, "read_query");
        assert_eq!(descriptor.description, "Run a SELECT query");
        assert_eq!(descriptor.input_schema["properties"]["query"]["type"], "string");
    }
}
