//! SLOP tool server: exposes a [`ToolRegistry`](crate::tools::ToolRegistry)
//! over HTTP.
//!
//! - `GET /tools` lists the tool descriptors
//! - `POST /tools/{tool_id}` runs a tool with a JSON object of named
//!   parameters and answers `{ "result": ... }`

mod error;
mod handlers;

pub use error::ServerError;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::config::ToolServerConfig;
use crate::error::{LlmError, Result};
use crate::tools::ToolRegistry;

/// Shared state of the tool server.
#[derive(Clone, Debug)]
pub struct ToolServerState {
    pub tools: Arc<ToolRegistry>,
}

impl ToolServerState {
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            tools: Arc::new(tools),
        }
    }
}

/// Create the tool server router.
pub fn create_router(state: ToolServerState) -> Router {
    Router::new()
        .route("/tools", get(handlers::list_tools))
        .route("/tools/{tool_id}", post(handlers::use_tool))
        .with_state(state)
}

/// Bind the configured address and serve until ctrl-c.
pub async fn run_server(state: ToolServerState, config: &ToolServerConfig) -> Result<()> {
    let listener = config.bind().await?;
    let addr = listener.local_addr()?;
    tracing::info!(target: "llmcall::server", %addr, "SLOP API running");
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(LlmError::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(target: "llmcall::server", error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
