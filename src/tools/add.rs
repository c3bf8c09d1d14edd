use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, argument};
use crate::error::LlmError;
use crate::types::ToolDescriptor;

/// Adds two integers `a` and `b`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddTool;

/// Integer coercion with the same leniency as Python's `int()`:
/// integers, floats (truncated toward zero), numeric strings and booleans.
pub(crate) fn coerce_int(name: &str, value: &Value) -> Result<i64, LlmError> {
    let invalid = || LlmError::InvalidInput(format!("argument '{name}' is not an integer: {value}"));
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
                    .ok_or_else(invalid)
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        Value::Bool(b) => Ok(i64::from(*b)),
        _ => Err(invalid()),
    }
}

#[async_trait]
impl Tool for AddTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "add",
            "Add two numbers, `a` and `b`, and returns their sum.",
            json!({
                "type": "object",
                "properties": {
                    "a": {"type": "number"},
                    "b": {"type": "number"}
                },
                "required": ["a", "b"]
            }),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<Value, LlmError> {
        let a = coerce_int("a", argument(&arguments, "a")?)?;
        let b = coerce_int("b", argument(&arguments, "b")?)?;
        let sum = a
            .checked_add(b)
            .ok_or_else(|| LlmError::InvalidInput(format!("{a} + {b} overflows")))?;
        Ok(json!(sum))
    }
}
