use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Tool, argument};
use crate::error::LlmError;
use crate::types::ToolDescriptor;

/// Weather lookup over a fixed table of cities.
#[derive(Debug, Clone)]
pub struct WeatherTool {
    reports: HashMap<&'static str, &'static str>,
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherTool {
    pub fn new() -> Self {
        let reports = HashMap::from([
            (
                "newyork",
                "The weather in New York is sunny with a temperature of 25°C.",
            ),
            (
                "london",
                "It's cloudy in London with a temperature of 15°C.",
            ),
            (
                "tokyo",
                "Tokyo is experiencing light rain and a temperature of 18°C.",
            ),
        ]);
        Self { reports }
    }

    /// Report for `city`; lookups ignore case and spaces.
    pub fn report(&self, city: &str) -> Value {
        let normalized: String = city
            .to_lowercase()
            .chars()
            .filter(|c| *c != ' ')
            .collect();
        match self.reports.get(normalized.as_str()) {
            Some(report) => json!({"status": "success", "report": report}),
            None => json!({
                "status": "error",
                "error_message": format!("Sorry, I don't have weather information for '{city}'.")
            }),
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "get_weather",
            "Retrieves the current weather report for a specified city. \
             Returns a dictionary with a 'status' key ('success' or 'error'); \
             'report' holds the details on success, 'error_message' on error.",
            json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "The name of the city (e.g., \"New York\", \"London\", \"Tokyo\")."
                    }
                },
                "required": ["city"]
            }),
        )
    }

    async fn execute(&self, arguments: Value) -> Result<Value, LlmError> {
        let city = argument(&arguments, "city")?
            .as_str()
            .ok_or_else(|| LlmError::InvalidInput("argument 'city' must be a string".into()))?;
        tracing::info!(target: "llmcall::tools", city, "get_weather called");
        Ok(self.report(city))
    }
}
