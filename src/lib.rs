//! # llmcall
//!
//! Small, self-contained demonstrations of calling OpenAI-compatible chat
//! completion APIs (OpenRouter by default):
//!
//! - [`streaming`]: reduce a streaming (SSE) chat completion to one answer
//! - [`client`]: streaming and non-streaming `/chat/completions` calls
//! - [`validate`]: check a JSON answer against a schema
//! - [`server`] / [`slop`]: a tiny HTTP tool server and the prompt-level
//!   tool calling protocol that uses it
//! - [`tools`] / [`agent`]: native tool calling with an explicit tool registry
//!
//! ## Example
//!
//! ```rust,ignore
//! use llmcall::prelude::*;
//!
//! let client = ChatClient::new(ClientConfig::from_env())?;
//! let request = client.request(vec![ChatMessage::user("Say hello")]);
//! let reduction = client.send(&request).await.into_compat();
//! println!("{}", reduction.content);
//! ```

#![deny(unsafe_code)]

pub mod agent;
pub mod client;
pub mod config;
pub mod error;
pub mod server;
pub mod slop;
pub mod streaming;
pub mod telemetry;
pub mod tools;
pub mod types;
pub mod validate;

/// Commonly used types.
pub mod prelude {
    pub use crate::client::{ChatClient, ChatOutcome, Completion};
    pub use crate::config::{ClientConfig, ToolServerConfig};
    pub use crate::error::{LlmError, Result};
    pub use crate::streaming::{Reduction, StreamingChatReducer};
    pub use crate::tools::{Tool, ToolRegistry, ToolResolver};
    pub use crate::types::{ChatMessage, ChatRequest, CompletionRequest, MessageRole, Usage};
}
