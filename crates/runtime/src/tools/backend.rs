//! Tool backend trait.

use crate::model::ToolDescriptor;
use crate::tools::{BackendError, CallOutcome};
use serde_json::{Map, Value};
use std::future::Future;

/// A server that exposes callable tools.
///
/// This is the boundary between the conversation loop and side effects.
pub trait ToolBackend: Send + Sync {
    /// Name used in logs and collision reports.
    fn name(&self) -> &str;

    /// Enumerate the tools this backend exposes.
    fn list_tools(&self) -> impl Future<Output = Result<Vec<ToolDescriptor>, BackendError>> + Send;

    /// Invoke one tool with already-parsed arguments.
    fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> impl Future<Output = Result<CallOutcome, BackendError>> + Send;
}
