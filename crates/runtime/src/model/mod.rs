//! Model client protocol types and trait.

pub mod errors;
pub mod types;

pub use errors::ModelError;
pub use types::{Completion, ModelClient, ModelRequest, ToolCallRequest, ToolDescriptor, Usage};
