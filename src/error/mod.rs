//! Error Handling Module
//!
//! Core error type (`LlmError`), its coarse `ErrorCategory`, conversions from
//! the crates we sit on top of, and classification of HTTP error bodies
//! returned by OpenAI-compatible endpoints.
//!
//! # Example
//!
//! ```rust,ignore
//! use llmcall::error::{classify_http_error, ErrorCategory};
//!
//! let error = classify_http_error(401, r#"{"error":{"message":"No auth"}}"#);
//! assert_eq!(error.category(), ErrorCategory::Api);
//! ```

mod conversions;
mod types;

pub use types::*;
