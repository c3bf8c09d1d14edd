//! HTTP error handling and response mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Tool not found")]
    ToolNotFound,

    #[error("{0}")]
    InvalidArguments(String),

    #[error("tool failed: {0}")]
    ToolFailed(LlmError),
}

impl From<LlmError> for ServerError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::UnknownTool(_) => Self::ToolNotFound,
            LlmError::InvalidInput(msg) => Self::InvalidArguments(msg),
            other => Self::ToolFailed(other),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ToolNotFound => StatusCode::NOT_FOUND,
            Self::InvalidArguments(_) => StatusCode::BAD_REQUEST,
            Self::ToolFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::warn!(target: "llmcall::server", error = %self, "tool request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
