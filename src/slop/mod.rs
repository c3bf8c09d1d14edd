//! SLOP: a prompt-level tool calling protocol.
//!
//! The model is shown the available tools and asked to answer with a JSON
//! envelope listing the calls it needs instead of answering. The calls are
//! run against a tool server, and a second request answers the question
//! from the results.

mod envelope;
mod prompts;
mod remote;
mod session;

pub use envelope::{SlopToolCall, ToolCallEnvelope};
pub use prompts::{answer_system_prompt, render_tool_listing_prompt, results_user_message};
pub use remote::{DEFAULT_TOOL_SERVER_URL, ToolServerClient};
pub use session::{SlopSession, SlopTranscript};
