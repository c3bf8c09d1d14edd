//! Structured output validation
//!
//! The model is told to answer with bare JSON matching a schema; the answer
//! is then parsed, checked against the JSON Schema and decoded into a typed
//! value. Every failure is surfaced as [`LlmError::SchemaValidation`] with a
//! readable diagnostic.
//!
//! ## Example
//!
//! ```rust,ignore
//! use llmcall::validate::{Measurement, StructuredOutput};
//!
//! let output = StructuredOutput::<Measurement>::new(&Measurement::json_schema())?;
//! let m = output.validate(&reduction.content)?;
//! ```

mod measurement;

pub use measurement::Measurement;

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{LlmError, Result};

const SYSTEM_PROMPT_TEMPLATE: &str = "
{query}

Output using the following JSON schema:

{schema}

IMPORTANT:
- Do not add any other text than the JSON output.
- Do not add ```json at the beginning of the output.
- Do not add ``` at the end of the output.
";

/// System prompt asking for output matching `schema`.
pub fn render_system_prompt(query: &str, schema: &Value) -> Result<String> {
    let schema = serde_json::to_string_pretty(schema)?;
    Ok(SYSTEM_PROMPT_TEMPLATE
        .replace("{query}", query)
        .replace("{schema}", &schema))
}

/// At most three violations are reported, joined by `; `.
fn check(validator: &jsonschema::Validator, instance: &Value) -> Result<()> {
    if validator.is_valid(instance) {
        return Ok(());
    }
    let mut msgs = Vec::new();
    for err in validator.iter_errors(instance) {
        msgs.push(format!("{} at {}", err, err.instance_path));
        if msgs.len() >= 3 {
            break;
        }
    }
    Err(LlmError::SchemaValidation(msgs.join("; ")))
}

/// A compiled schema plus the type the validated output decodes into.
pub struct StructuredOutput<T> {
    schema: Value,
    validator: jsonschema::Validator,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for StructuredOutput<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredOutput")
            .field("schema", &self.schema)
            .finish()
    }
}

impl<T: DeserializeOwned> StructuredOutput<T> {
    /// Compile `schema`; an invalid schema is [`LlmError::SchemaCompilation`].
    pub fn new(schema: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| LlmError::SchemaCompilation(format!("Invalid JSON Schema: {}", e)))?;
        Ok(Self {
            schema: schema.clone(),
            validator,
            _marker: PhantomData,
        })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Parse, schema-check and decode a model answer.
    pub fn validate(&self, content: &str) -> Result<T> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(LlmError::SchemaValidation(
                "model returned no content".to_string(),
            ));
        }
        let value: Value = serde_json::from_str(trimmed).map_err(|e| {
            LlmError::SchemaValidation(format!("output is not valid JSON: {e}"))
        })?;
        check(&self.validator, &value)?;
        serde_json::from_value(value)
            .map_err(|e| LlmError::SchemaValidation(format!("output does not match type: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named() -> StructuredOutput<Value> {
        StructuredOutput::new(&json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_success() {
        assert_eq!(named().validate(r#"{"name": "Alice"}"#).unwrap(), json!({"name": "Alice"}));
    }

    #[test]
    fn test_validate_failure_names_the_path() {
        let err = named().validate(r#"{"name": 123}"#).unwrap_err();
        assert!(matches!(err, LlmError::SchemaValidation(ref m) if m.contains("/name")));
    }

    #[test]
    fn test_reports_at_most_three_violations() {
        let output = StructuredOutput::<Value>::new(&json!({
            "type": "object",
            "required": ["a", "b", "c", "d", "e"]
        }))
        .unwrap();
        let err = output.validate("{}").unwrap_err();
        let LlmError::SchemaValidation(msg) = err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(msg.split("; ").count(), 3);
    }

    #[test]
    fn test_invalid_schema() {
        let err = StructuredOutput::<Value>::new(&json!({"type": 12})).unwrap_err();
        assert!(matches!(err, LlmError::SchemaCompilation(_)));
    }

    #[test]
    fn prompt_embeds_query_and_schema() {
        let prompt = render_system_prompt("Convert units.", &json!({"type": "object"})).unwrap();
        assert!(prompt.contains("Convert units."));
        assert!(prompt.contains("\"type\": \"object\""));
        assert!(prompt.contains("Do not add ```json"));
    }
}
