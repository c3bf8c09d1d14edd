//! Request, message and tool types shared by the client, the agent and the
//! tool server.

mod chat;
mod tools;
mod usage;

pub use chat::*;
pub use tools::*;
pub use usage::*;
