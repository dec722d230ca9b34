//! Conversion of MCP tool listings to the OpenAI function-calling schema.
//!
//! Stateless plumbing: MCP input schemas are already JSON Schema, so they
//! pass through as the `parameters` field unchanged.

use rmcp::model::Tool;
use serde_json::{json, Value};

/// Map MCP tool definitions to OpenAI `tools` entries.
///
/// ```
/// use multimcp_client::openai::tools_to_openai_format;
/// # let tools: Vec<rmcp::model::Tool> = vec![];
/// let openai_tools = tools_to_openai_format(&tools);
/// ```
pub fn tools_to_openai_format<'a>(tools: impl IntoIterator<Item = &'a Tool>) -> Vec<Value> {
    tools
        .into_iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.input_schema.as_ref(),
                },
            })
        })
        .collect()
}
