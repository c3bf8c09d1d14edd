use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{Tool, ToolResolver};
use crate::error::LlmError;
use crate::types::{ToolDefinition, ToolDescriptor};

/// Immutable mapping from tool id to implementation.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<BTreeMap<String, Arc<dyn Tool>>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tools.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors in id order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor()).collect()
    }

    /// OpenAI `tools` list for a completion request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| t.descriptor().to_definition())
            .collect()
    }
}

#[async_trait]
impl ToolResolver for ToolRegistry {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, LlmError> {
        let tool = self
            .get(name)
            .ok_or_else(|| LlmError::UnknownTool(name.to_string()))?;
        tracing::debug!(target: "llmcall::tools", tool = name, "executing tool");
        tool.execute(arguments).await
    }
}

/// Collects tools before freezing them into a [`ToolRegistry`].
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    /// Add a tool; a later tool with the same id replaces the earlier one.
    pub fn register(mut self, tool: impl Tool + 'static) -> Self {
        let id = tool.descriptor().id;
        self.tools.insert(id, Arc::new(tool));
        self
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            tools: Arc::new(self.tools),
        }
    }
}
