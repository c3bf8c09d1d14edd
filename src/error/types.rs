//! Error types shared by every module of the crate.

use serde_json::Value;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Unified error type.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// HTTP transport error that is neither a timeout nor a connect failure
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Connection could not be established (refused, DNS, TLS)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Request or body read timed out
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// Non-2xx response from a remote API
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<Value>,
    },

    /// Remote service rejected the credentials
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    JsonError(String),

    /// A response body could not be interpreted
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Reading a streaming body failed part way through
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Model output did not satisfy the expected shape
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    /// The JSON Schema itself is invalid
    #[error("Schema compilation error: {0}")]
    SchemaCompilation(String),

    /// A tool call named a tool nobody provides
    #[error("Unknown tool call: {0}")]
    UnknownTool(String),

    /// A tool was found but failed while executing
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecutionError { tool: String, message: String },

    /// Caller supplied arguments that cannot be used
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Telemetry initialization error: {0}")]
    TelemetryInit(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Coarse error grouping for presentation and control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request never produced a usable response
    Transport,
    /// The remote API answered with an error
    Api,
    /// A body or stream could not be decoded
    Parsing,
    /// Output was decoded but has the wrong shape
    Validation,
    /// Tool lookup or execution failed
    Tool,
    /// Local configuration or setup problem
    Configuration,
}

impl LlmError {
    /// Build an `ApiError` without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Build a `ToolExecutionError`.
    pub fn tool_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecutionError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_)
            | Self::ConnectionError(_)
            | Self::TimeoutError(_)
            | Self::StreamError(_)
            | Self::IoError(_) => ErrorCategory::Transport,
            Self::ApiError { .. } | Self::AuthenticationError(_) => ErrorCategory::Api,
            Self::JsonError(_) | Self::ParseError(_) => ErrorCategory::Parsing,
            Self::SchemaValidation(_) | Self::InvalidInput(_) => ErrorCategory::Validation,
            Self::UnknownTool(_) | Self::ToolExecutionError { .. } => ErrorCategory::Tool,
            Self::SchemaCompilation(_)
            | Self::ConfigurationError(_)
            | Self::TelemetryInit(_) => ErrorCategory::Configuration,
        }
    }

    /// True for failures raised while issuing or reading an HTTP request,
    /// including non-2xx answers.
    pub fn is_transport(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::Api
        )
    }

    /// HTTP status code, when the error came from a remote answer.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            Self::AuthenticationError(_) => Some(401),
            _ => None,
        }
    }
}

/// Classify a non-2xx response from an OpenAI-compatible endpoint.
///
/// OpenAI-style APIs return `{ "error": { "message": "...", "type": "...", "code": ... } }`.
/// Bodies that don't match the envelope keep their raw text as the message.
pub fn classify_http_error(status: u16, body_text: &str) -> LlmError {
    let json: Option<Value> = serde_json::from_str(body_text).ok();
    let message = json
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| match e {
            Value::String(s) => Some(s.clone()),
            Value::Object(o) => o.get("message").and_then(|m| m.as_str()).map(str::to_string),
            _ => None,
        })
        .unwrap_or_else(|| {
            let trimmed = body_text.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_string()
            }
        });

    if status == 401 || status == 403 {
        return LlmError::AuthenticationError(message);
    }

    LlmError::ApiError {
        code: status,
        message,
        details: json,
    }
}
