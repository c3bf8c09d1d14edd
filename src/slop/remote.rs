//! HTTP client for a SLOP tool server.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{LlmError, Result, classify_http_error};
use crate::tools::ToolResolver;
use crate::types::ToolDescriptor;

pub const DEFAULT_TOOL_SERVER_URL: &str = "http://localhost:3030";

#[derive(Deserialize)]
struct ToolList {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}

/// Talks to `GET /tools` and `POST /tools/{id}`.
#[derive(Debug, Clone)]
pub struct ToolServerClient {
    http: reqwest::Client,
    base_url: String,
}

impl ToolServerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let response = self
            .http
            .get(format!("{}/tools", self.base_url))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status.as_u16(), &body));
        }
        let list: ToolList = response.json().await?;
        Ok(list.tools)
    }

    /// Execute `tool_id` and return the `result` field of the answer.
    pub async fn call(&self, tool_id: &str, params: &Value) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}/tools/{}", self.base_url, tool_id))
            .json(params)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LlmError::UnknownTool(tool_id.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match classify_http_error(status.as_u16(), &body) {
                LlmError::ApiError { message, .. } if status.is_client_error() => {
                    LlmError::tool_error(tool_id, message)
                }
                other => other,
            });
        }

        let mut body: Value = response.json().await?;
        body.get_mut("result").map(Value::take).ok_or_else(|| {
            LlmError::ParseError(format!("tool server answer for '{tool_id}' has no result"))
        })
    }
}

#[async_trait]
impl ToolResolver for ToolServerClient {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        self.call(name, &arguments).await
    }
}
