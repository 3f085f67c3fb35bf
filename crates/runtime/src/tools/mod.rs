//! Tool discovery, routing and invocation.

mod backend;
pub mod dispatch;
pub mod errors;
mod mcp_host;
pub mod registry;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::ToolBackend;
pub use dispatch::{Dispatcher, NO_RESPONSE, UNKNOWN_ERROR, parse_arguments};
pub use errors::{BackendError, ToolError};
pub use mcp_host::{McpBackend, ServerConfig};
pub use registry::{BackendId, DuplicatePolicy, Registry};
pub use types::{CallOutcome, ToolCallResult, ToolOutcome};
