//! Route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::{Value, json};

use super::{ServerError, ToolServerState};
use crate::tools::ToolResolver;

/// `GET /tools`
pub async fn list_tools(State(state): State<ToolServerState>) -> Json<Value> {
    Json(json!({ "tools": state.tools.descriptors() }))
}

/// `POST /tools/{tool_id}`
pub async fn use_tool(
    State(state): State<ToolServerState>,
    Path(tool_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ServerError> {
    // An unknown id wins over a malformed body.
    if !state.tools.contains(&tool_id) {
        return Err(ServerError::ToolNotFound);
    }
    let Json(params) = body.map_err(|e| ServerError::InvalidArguments(e.body_text()))?;
    if !params.is_object() {
        return Err(ServerError::InvalidArguments(
            "parameters must be a JSON object".to_string(),
        ));
    }

    let result = state.tools.call_tool(&tool_id, params).await?;
    tracing::debug!(target: "llmcall::server", tool = %tool_id, "tool executed");
    Ok(Json(json!({ "result": result })))
}
