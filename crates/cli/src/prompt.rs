//! System prompt built from the discovered tools.

use runtime::ToolDescriptor;

const PREAMBLE: &str = "You are a helpful assistant with access to the tools listed below. \
Call a tool whenever it gets you a better answer than guessing.";

const GUIDELINES: &str = "\
Guidelines:
- Work step by step and check assumptions before acting on them.
- Inspect before you change: read a schema before querying, list before reading.
- Start with simple calls and build on what they return.
- When a tool reports an error, read it and adjust rather than repeating the call.
- Say what you did and what you found. Ask when the request is ambiguous.";

/// Describe every tool, with its argument schema, followed by working guidelines.
pub fn system_prompt(tools: &[ToolDescriptor]) -> String {
    let mut prompt = String::from(PREAMBLE);
    prompt.push_str("\n\nTools:\n");

    for tool in tools {
        prompt.push_str("\n- ");
        prompt.push_str(&tool.name);
        if !tool.description.is_empty() {
            prompt.push_str(&format!(": {}", tool.description.trim()));
        }
        let schema = serde_json::to_string(&tool.input_schema).unwrap_or_default();
        prompt.push_str(&format!("\n  arguments: {schema}"));
    }

    prompt.push_str("\n\n");
    prompt.push_str(GUIDELINES);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lists_each_tool_with_schema() {
        let tools = vec![
            ToolDescriptor::new("read_query", json!({"type": "object"}))
                .with_description("Run a SELECT query"),
            ToolDescriptor::new("list_tables", json!({})),
        ];

        let prompt = system_prompt(&tools);
        assert!(prompt.starts_with(PREAMBLE));
        assert!(prompt.contains("- read_query: Run a SELECT query\n  arguments: {\"type\":\"object\"}"));
        assert!(prompt.contains("- list_tables\n  arguments: {}"));
        assert!(prompt.ends_with(GUIDELINES));
    }
}
