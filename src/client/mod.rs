//! Chat completions client for OpenAI-compatible endpoints.

mod chat;
mod interceptor;

pub use chat::*;
pub use interceptor::*;
