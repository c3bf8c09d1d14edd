use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LlmError, Result};

/// `{ "tools": [ { "tool_name": ..., "parameters": {...}, "result": ... } ] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallEnvelope {
    pub tools: Vec<SlopToolCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlopToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Filled in once the call has been executed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl SlopToolCall {
    pub fn new(tool_name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters,
            result: None,
        }
    }
}

impl ToolCallEnvelope {
    /// Parse the model's planning answer.
    ///
    /// The answer must be the bare JSON envelope; surrounding whitespace is
    /// the only tolerance. The error message carries the rejected answer.
    pub fn from_model_output(content: &str) -> Result<Self> {
        let trimmed = content.trim();
        serde_json::from_str(trimmed).map_err(|e| {
            LlmError::ParseError(format!(
                "model answer is not a tool call envelope ({e}): {trimmed}"
            ))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_planning_answer() {
        let content = r#"
        {
            "tools": [
                {"tool_name": "add", "parameters": {"a": 2, "b": 3}}
            ]
        }
        "#;
        let env = ToolCallEnvelope::from_model_output(content).unwrap();
        assert_eq!(env.tools.len(), 1);
        assert_eq!(env.tools[0].tool_name, "add");
        assert_eq!(env.tools[0].parameters["a"], 2);
        assert!(env.tools[0].result.is_none());
    }

    #[test]
    fn empty_tool_list_is_valid() {
        let env = ToolCallEnvelope::from_model_output(r#"{"tools": []}"#).unwrap();
        assert!(env.is_empty());
    }

    #[test]
    fn prose_answer_is_a_parse_error() {
        let err = ToolCallEnvelope::from_model_output("Dickens wrote Bleak House.\n").unwrap_err();
        assert!(
            matches!(err, LlmError::ParseError(ref m) if m.ends_with(": Dickens wrote Bleak House."))
        );
    }

    #[test]
    fn result_serialized_only_when_present() {
        let mut call = SlopToolCall::new("add", json!({"a": 1}).as_object().unwrap().clone());
        let without = serde_json::to_value(&call).unwrap();
        assert!(without.get("result").is_none());

        call.result = Some(json!(3));
        let with = serde_json::to_value(&call).unwrap();
        assert_eq!(with["result"], 3);
    }
}
