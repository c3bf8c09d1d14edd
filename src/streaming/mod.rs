//! Streaming Module
//!
//! Consumption of OpenAI-compatible streaming chat completions:
//! - splitting a response body into SSE lines (UTF-8 safe across chunks)
//! - reducing the `data:` lines into one text answer plus optional usage

mod lines;
mod reducer;

pub use lines::*;
pub use reducer::*;
