//! Tools callable by a model or by the tool server.
//!
//! Tools are collected once into an immutable [`ToolRegistry`] and handed to
//! whatever dispatches calls (the tool server, the agent runner, the tool
//! calling demo). There is no global tool table.

mod add;
mod gutenberg;
mod registry;
mod weather;

pub use add::AddTool;
pub use gutenberg::{BookSummary, GutenbergSearchTool};
pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use weather::WeatherTool;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LlmError;
use crate::types::ToolDescriptor;

/// A capability that can be executed with named JSON arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Identifier, description and parameter schema.
    fn descriptor(&self) -> ToolDescriptor;

    /// Run the tool. Argument problems are reported as
    /// [`LlmError::InvalidInput`].
    async fn execute(&self, arguments: Value) -> Result<Value, LlmError>;
}

/// A simple tool resolver abstraction.
#[async_trait]
pub trait ToolResolver: Send + Sync {
    /// Execute a tool by name with structured JSON arguments.
    /// Returns a structured JSON value as tool output; an unknown name is
    /// [`LlmError::UnknownTool`].
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, LlmError>;
}

/// Fetch a named argument from a JSON object of arguments.
pub(crate) fn argument<'a>(arguments: &'a Value, name: &str) -> Result<&'a Value, LlmError> {
    arguments
        .get(name)
        .ok_or_else(|| LlmError::InvalidInput(format!("missing argument '{name}'")))
}
