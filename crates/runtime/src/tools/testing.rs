//! In-memory backend for unit tests.

use crate::model::ToolDescriptor;
use crate::tools::{BackendError, CallOutcome, ToolBackend};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

pub(crate) struct StaticBackend {
    name: String,
    tools: Vec<ToolDescriptor>,
    replies: HashMap<String, Result<CallOutcome, String>>,
    fail_listing: bool,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl StaticBackend {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tools: Vec::new(),
            replies: HashMap::new(),
            fail_listing: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn tool(mut self, name: &str, reply: CallOutcome) -> Self {
        self.tools
            .push(ToolDescriptor::new(name, json!({ "type": "object" })));
        self.replies.insert(name.to_string(), Ok(reply));
        self
    }

    pub(crate) fn unreachable_tool(mut self, name: &str, message: &str) -> Self {
        self.tools
            .push(ToolDescriptor::new(name, json!({ "type": "object" })));
        self.replies.insert(name.to_string(), Err(message.to_string()));
        self
    }

    pub(crate) fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolBackend for StaticBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, BackendError> {
        if self.fail_listing {
            return Err(BackendError::Request {
                server: self.name.clone(),
                message: "listing refused".into(),
            });
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallOutcome, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        match self.replies.get(name) {
            Some(Ok(outcome)) => Ok(outcome.clone()),
            Some(Err(message)) => Err(BackendError::Request {
                server: self.name.clone(),
                message: message.clone(),
            }),
            None => Ok(CallOutcome::default()),
        }
    }
}
