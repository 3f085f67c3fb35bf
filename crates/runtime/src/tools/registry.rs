//! Tool name to backend routing.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::model::ToolDescriptor;
use crate::tools::{ToolBackend, ToolError};
use crate::{Error, Result};

/// Index of a backend inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendId(usize);

/// What to do when two backends expose the same tool name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Refuse to build the registry.
    #[default]
    Reject,
    /// Keep the earlier registration and drop the later one with a warning.
    KeepFirst,
}

/// Routing table built once per session from every backend's tool listing.
///
/// Read-only after [`Registry::discover`] returns.
pub struct Registry<B> {
    backends: Vec<B>,
    routes: HashMap<String, BackendId>,
    schema: Vec<ToolDescriptor>,
}

impl<B: ToolBackend> Registry<B> {
    /// List the tools of every backend, in order, and build the routing map.
    ///
    /// A backend whose listing fails contributes no tools. Fails with
    /// [`Error::NoToolsAvailable`] if nothing was registered.
    pub async fn discover(backends: Vec<B>, policy: DuplicatePolicy) -> Result<Self> {
        let mut registry = Self {
            backends: Vec::with_capacity(backends.len()),
            routes: HashMap::new(),
            schema: Vec::new(),
        };

        for backend in backends {
            let id = BackendId(registry.backends.len());
            let tools = match backend.list_tools().await {
                Ok(tools) => tools,
                Err(e) => {
                    warn!(server = backend.name(), error = %e, "tool discovery failed");
                    Vec::new()
                }
            };
            info!(server = backend.name(), count = tools.len(), "discovered tools");
            registry.backends.push(backend);

            for tool in tools {
                registry.register(id, tool, policy)?;
            }
        }

        if registry.routes.is_empty() {
            return Err(Error::NoToolsAvailable);
        }
        Ok(registry)
    }

    fn register(&mut self, id: BackendId, tool: ToolDescriptor, policy: DuplicatePolicy) -> Result<()> {
        if tool.name.trim().is_empty() {
            warn!(server = self.backends[id.0].name(), "skipping tool without a name");
            return Ok(());
        }

        if let Some(existing) = self.routes.get(&tool.name) {
            let first = self.backends[existing.0].name().to_string();
            let second = self.backends[id.0].name().to_string();
            return match policy {
                DuplicatePolicy::Reject => Err(Error::DuplicateTool {
                    name: tool.name,
                    first,
                    second,
                }),
                DuplicatePolicy::KeepFirst => {
                    warn!(tool = %tool.name, kept = %first, dropped = %second, "duplicate tool name");
                    Ok(())
                }
            };
        }

        debug!(tool = %tool.name, server = self.backends[id.0].name(), "registered tool");
        self.routes.insert(tool.name.clone(), id);
        self.schema.push(tool);
        Ok(())
    }

    /// The backend that owns `name`.
    pub fn resolve(&self, name: &str) -> std::result::Result<&B, ToolError> {
        self.route(name)
            .and_then(|id| self.backend(id))
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    pub fn route(&self, name: &str) -> Option<BackendId> {
        self.routes.get(name).copied()
    }

    pub fn backend(&self, id: BackendId) -> Option<&B> {
        self.backends.get(id.0)
    }

    /// Connected backends, in discovery order.
    pub fn backends(&self) -> &[B] {
        &self.backends
    }

    /// Every registered tool, in discovery order.
    pub fn schema(&self) -> &[ToolDescriptor] {
        &self.schema
    }

    /// Registered tools paired with the backend that owns each.
    pub fn entries(&self) -> impl Iterator<Item = (&ToolDescriptor, &B)> {
        self.schema
            .iter()
            .filter_map(|tool| {
                let backend = self.route(&tool.name).and_then(|id| self.backend(id))?;
                Some((tool, backend))
            })
    }

    pub fn len(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }
}
