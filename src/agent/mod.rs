//! Single-turn tool calling agent.
//!
//! The runner sends the agent's instruction and the user query, executes
//! every native tool call the model asks for, feeds the results back, and
//! stops at the first assistant message without tool calls.

use serde_json::Value;

use crate::client::ChatClient;
use crate::error::{LlmError, Result};
use crate::tools::{ToolRegistry, ToolResolver};
use crate::types::{ChatMessage, CompletionRequest, ToolCall};

pub const NO_FINAL_RESPONSE: &str = "Agent did not produce a final response.";
pub const DEFAULT_MAX_STEPS: usize = 8;

/// Agent definition: prompt, model and tools.
#[derive(Debug, Clone)]
pub struct Agent {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub model: String,
    pub tools: ToolRegistry,
}

impl Agent {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            model: model.into(),
            tools: ToolRegistry::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }
}

/// Something that happened while the agent worked on a query.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    ToolCall { name: String, arguments: Value },
    ToolResult { name: String, result: Value },
    FinalResponse { text: String },
    Escalated { message: String },
}

/// Outcome of [`Runner::run`].
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub text: String,
    pub events: Vec<AgentEvent>,
}

/// Drives an [`Agent`] against a chat completions endpoint.
#[derive(Debug, Clone)]
pub struct Runner {
    agent: Agent,
    client: ChatClient,
    max_steps: usize,
}

impl Runner {
    pub fn new(agent: Agent, client: ChatClient) -> Self {
        Self {
            agent,
            client,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Maximum number of model calls per query (at least one).
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Answer one query. Transport and API errors are returned; tool
    /// failures are reported to the model as tool output instead.
    pub async fn run(&self, query: &str) -> Result<AgentReply> {
        let mut messages = Vec::with_capacity(4);
        if !self.agent.instruction.is_empty() {
            messages.push(ChatMessage::system(&self.agent.instruction));
        }
        messages.push(ChatMessage::user(query));

        let definitions = self.agent.tools.definitions();
        let mut events = Vec::new();

        for step in 0..self.max_steps {
            let request = CompletionRequest::new(&self.agent.model, messages.clone())
                .with_tools(definitions.clone());
            let completion = self.client.complete(&request).await?;
            let message = completion.message;
            tracing::debug!(
                target: "llmcall::agent",
                agent = %self.agent.name,
                step,
                tool_calls = message.tool_calls.len(),
                "model step"
            );

            if !message.has_tool_calls() {
                let text = match message.content.as_deref() {
                    Some(text) if !text.is_empty() => text.to_string(),
                    _ => NO_FINAL_RESPONSE.to_string(),
                };
                events.push(AgentEvent::FinalResponse { text: text.clone() });
                return Ok(AgentReply { text, events });
            }

            let calls = message.tool_calls.clone();
            messages.push(message);
            for call in &calls {
                let (arguments, result) = self.execute(call).await;
                events.push(AgentEvent::ToolCall {
                    name: call.function.name.clone(),
                    arguments,
                });
                events.push(AgentEvent::ToolResult {
                    name: call.function.name.clone(),
                    result: result.clone(),
                });
                messages.push(ChatMessage::tool_result(&call.id, result.to_string()));
            }
        }

        let message = format!("no final answer after {} steps", self.max_steps);
        events.push(AgentEvent::Escalated {
            message: message.clone(),
        });
        Ok(AgentReply {
            text: format!("Agent escalated: {message}"),
            events,
        })
    }

    /// Run one tool call; errors become an `{"error": ...}` result.
    async fn execute(&self, call: &ToolCall) -> (Value, Value) {
        let name = &call.function.name;
        let raw = if call.function.arguments.trim().is_empty() {
            "{}"
        } else {
            call.function.arguments.as_str()
        };
        let arguments = match serde_json::from_str::<Value>(raw) {
            Ok(arguments) => arguments,
            Err(e) => {
                let err = LlmError::tool_error(name, format!("arguments are not valid JSON: {e}"));
                return (
                    Value::String(call.function.arguments.clone()),
                    serde_json::json!({ "error": err.to_string() }),
                );
            }
        };
        match self.agent.tools.call_tool(name, arguments.clone()).await {
            Ok(result) => (arguments, result),
            Err(err) => {
                tracing::warn!(target: "llmcall::agent", tool = %name, error = %err, "tool call failed");
                (arguments, serde_json::json!({ "error": err.to_string() }))
            }
        }
    }
}

/// Weather assistant over the mocked `get_weather` tool.
pub fn weather_agent(model: impl Into<String>) -> Agent {
    Agent::new("weather_agent", model)
        .with_description("Provides weather information.")
        .with_instruction(
            "You are a helpful weather assistant. \
             Use the 'get_weather' tool for city weather requests. \
             Analyze the tool's dictionary output ('status', 'report'/'error_message'). \
             Clearly present successful reports or polite error messages.",
        )
        .with_tools(
            ToolRegistry::builder()
                .register(crate::tools::WeatherTool::new())
                .build(),
        )
}
