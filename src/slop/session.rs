use std::sync::Arc;

use serde_json::Value;

use super::envelope::ToolCallEnvelope;
use super::prompts::{answer_system_prompt, render_tool_listing_prompt, results_user_message};
use crate::client::ChatClient;
use crate::error::Result;
use crate::streaming::Reduction;
use crate::tools::ToolResolver;
use crate::types::{ChatMessage, ToolDescriptor};

/// Everything a SLOP run produced.
#[derive(Debug, Clone)]
pub struct SlopTranscript {
    /// Planning answer (the raw envelope text)
    pub plan: Reduction,
    /// Envelope with every call's `result` filled in
    pub executed: ToolCallEnvelope,
    /// Final answer
    pub answer: Reduction,
}

/// One question answered through the SLOP protocol.
pub struct SlopSession {
    llm: ChatClient,
    resolver: Arc<dyn ToolResolver>,
    tools: Vec<ToolDescriptor>,
}

impl SlopSession {
    /// `tools` are advertised to the model; calls go through `resolver`.
    pub fn new(
        llm: ChatClient,
        resolver: Arc<dyn ToolResolver>,
        tools: Vec<ToolDescriptor>,
    ) -> Self {
        Self {
            llm,
            resolver,
            tools,
        }
    }

    /// Ask for a plan, run the planned calls in order, then ask for the answer.
    ///
    /// A planning answer that is not an envelope, an unknown tool or a failed
    /// call aborts the run.
    pub async fn run(&self, question: &str) -> Result<SlopTranscript> {
        let plan_request = self.llm.request(vec![
            ChatMessage::system(render_tool_listing_prompt(&self.tools)?),
            ChatMessage::user(question),
        ]);
        let plan = self.llm.stream_chat(&plan_request).await?;
        tracing::debug!(target: "llmcall::slop", plan = %plan.content, "planning answer");

        let mut executed = ToolCallEnvelope::from_model_output(&plan.content)?;
        for call in &mut executed.tools {
            let params = Value::Object(call.parameters.clone());
            let result = self.resolver.call_tool(&call.tool_name, params).await?;
            tracing::info!(target: "llmcall::slop", tool = %call.tool_name, %result, "tool call executed");
            call.result = Some(result);
        }

        let answer_request = self.llm.request(vec![
            ChatMessage::system(answer_system_prompt()),
            ChatMessage::user(results_user_message(&executed, question)?),
        ]);
        let answer = self.llm.stream_chat(&answer_request).await?;

        Ok(SlopTranscript {
            plan,
            executed,
            answer,
        })
    }
}
