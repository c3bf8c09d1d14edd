//! Prompt texts of the two SLOP requests.

use serde_json::{Value, json};

use super::envelope::ToolCallEnvelope;
use crate::error::Result;
use crate::types::ToolDescriptor;

const TOOL_LISTING_INSTRUCTIONS: &str = r#"
Instead of answering a question that requires a tool call, DO NOT ANSWER THE QUESTION
but list the required tool calls in your response.

Example:

User: What is 2 + 3?
Assistant:
{
    "tools": [
        {
            "tool_name": "add",
            "parameters": {
                "a": 2,
                "b": 3
            }
        }
    ]
}
"#;

const ANSWER_SYSTEM_PROMPT: &str = r#"
You are an assistant that can answer questions based on previous results from tool calls.

You're going to receive a list of tool calls and the results of the tool calls.

They will have this format:

{
    "tools": [
        {
            "tool_name": "tool_name",
            "parameters": {
                "arg1": "arg1",
                "arg2": "arg2"
            },
            "result": "result"
        }
    ]
}

Example:

{
    "tools": [
        {
            "tool_name": "add",
            "parameters": {
                "a": 2,
                "b": 3
            },
            "result": 5
        }
    ]
}

Question:
What is 2 + 3?

Answer the user's question based on the results of the tool calls.
"#;

/// System prompt of the planning request, listing `tools`.
pub fn render_tool_listing_prompt(tools: &[ToolDescriptor]) -> Result<String> {
    let listed: Vec<Value> = tools
        .iter()
        .map(|t| {
            // Only the property map is shown, which is what the model needs
            // to fill in `parameters`.
            let parameters = t
                .parameters
                .get("properties")
                .cloned()
                .unwrap_or_else(|| t.parameters.clone());
            json!({
                "tool_name": t.id,
                "description": t.description,
                "parameters": parameters,
            })
        })
        .collect();
    let listing = serde_json::to_string_pretty(&json!({ "tools": listed }))?;
    Ok(format!(
        "\nUse the following tools to answer the user's question:\n\n{listing}\n{TOOL_LISTING_INSTRUCTIONS}"
    ))
}

/// System prompt of the answering request.
pub fn answer_system_prompt() -> &'static str {
    ANSWER_SYSTEM_PROMPT
}

/// User message of the answering request: executed calls plus the question.
pub fn results_user_message(executed: &ToolCallEnvelope, question: &str) -> Result<String> {
    Ok(format!(
        "\nTool calls:\n{}\n\nQuestion:\n{}\n",
        executed.to_pretty_json()?,
        question.trim()
    ))
}
