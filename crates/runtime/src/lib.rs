//! Switchboard runtime: a tool-augmented conversation loop.
//!
//! The runtime connects a language model to tools hosted by one or more
//! backends (MCP servers in practice) and keeps the conversation between
//! them.
//!
//! # Overview
//!
//! The runtime is organized around these concepts:
//!
//! - **Registry**: Tools discovered from every backend, each name routed to
//!   exactly one owner.
//! - **Dispatcher**: Turns one model tool call into one tool result. Never
//!   fails; problems become failure results the model can read.
//! - **Conversation**: The append-only log of turns sent with every
//!   completion request.
//! - **TurnController**: The loop. Reads input, asks the model, dispatches
//!   tools, asks again, renders the answer.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{
//!     DuplicatePolicy, McpBackend, Provider, ProviderClient, ProviderConfig, Registry,
//!     ServerConfig, SessionConfig, TurnController,
//! };
//!
//! # async fn example(surface: impl runtime::Surface) -> Result<(), Box<dyn std::error::Error>> {
//! let server = McpBackend::spawn(ServerConfig::new("sqlite", "uvx").arg("mcp-server-sqlite")).await?;
//! let registry = Registry::discover(vec![server], DuplicatePolicy::Reject).await?;
//! let model = ProviderClient::new(&ProviderConfig::new(Provider::Ollama));
//!
//! let mut controller = TurnController::new(
//!     model,
//!     registry,
//!     surface,
//!     "You are a helpful assistant.",
//!     SessionConfig::default(),
//! );
//! controller.run().await?;
//! # Ok(())
//! # }
//! ```

mod controller;
pub mod conversation;
mod error;
pub mod model;
pub mod providers;
pub mod tools;

// Conversation log
pub use conversation::{Conversation, Role, Turn};

// Error types
pub use error::{Error, Result};

// Model client protocol
pub use model::{
    Completion, ModelClient, ModelError, ModelRequest, ToolCallRequest, ToolDescriptor, Usage,
};

// Providers
pub use providers::{
    AnthropicBackend, OpenAiBackend, Provider, ProviderClient, ProviderConfig,
};

// Tools
pub use tools::{
    BackendError, BackendId, CallOutcome, Dispatcher, DuplicatePolicy, McpBackend, Registry,
    ServerConfig, ToolBackend, ToolCallResult, ToolError, ToolOutcome,
};

// Session loop
pub use controller::{SessionConfig, SessionState, Surface, TurnController};
