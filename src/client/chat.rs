//! Streaming and non-streaming chat completion calls.

use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::interceptor::{HttpInterceptor, HttpRequestContext, LoggingInterceptor};
use crate::config::ClientConfig;
use crate::error::{LlmError, Result, classify_http_error};
use crate::streaming::{Reduction, StreamingChatReducer, body_lines};
use crate::types::{ChatMessage, ChatRequest, CompletionRequest, Usage};

/// Result of a streaming call that keeps transport failures distinguishable
/// from an empty answer.
#[derive(Debug, Clone)]
pub enum ChatOutcome {
    Completed(Reduction),
    Failed(LlmError),
}

impl ChatOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn into_result(self) -> Result<Reduction> {
        match self {
            Self::Completed(reduction) => Ok(reduction),
            Self::Failed(err) => Err(err),
        }
    }

    /// Collapse failures into an empty reduction.
    ///
    /// The caller can no longer tell "the model said nothing" from "the
    /// request failed"; use only where that is acceptable.
    pub fn into_compat(self) -> Reduction {
        match self {
            Self::Completed(reduction) => reduction,
            Self::Failed(_) => Reduction::default(),
        }
    }
}

impl From<Result<Reduction>> for ChatOutcome {
    fn from(result: Result<Reduction>) -> Self {
        match result {
            Ok(reduction) => Self::Completed(reduction),
            Err(err) => Self::Failed(err),
        }
    }
}

/// First choice of a non-streaming completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// Calls are issued one at a time by the caller; nothing is shared between
/// calls except the connection pool of the underlying `reqwest::Client`.
#[derive(Clone)]
pub struct ChatClient {
    config: ClientConfig,
    http: reqwest::Client,
    interceptors: Vec<Arc<dyn HttpInterceptor>>,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("config", &self.config)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl ChatClient {
    /// Build a client with its own HTTP connection pool and the logging
    /// interceptor installed.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            LlmError::ConfigurationError(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self::with_http_client(config, http).with_interceptor(Arc::new(LoggingInterceptor)))
    }

    /// Use a caller-provided HTTP client; no interceptors are installed.
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            interceptors: Vec::new(),
        }
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn HttpInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Streaming request for the configured model and token limit.
    pub fn request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest::new(&self.config.model, messages, self.config.max_tokens)
    }

    fn context(&self, model: &str, stream: bool) -> HttpRequestContext {
        HttpRequestContext {
            url: self.config.chat_completions_url(),
            model: model.to_string(),
            stream,
        }
    }

    fn notify_error(&self, ctx: &HttpRequestContext, error: &LlmError) {
        for it in &self.interceptors {
            it.on_error(ctx, error);
        }
    }

    /// POST a JSON body and return the response once its status is known to
    /// be successful.
    async fn post<T: Serialize + ?Sized>(
        &self,
        ctx: &HttpRequestContext,
        body: &T,
    ) -> Result<reqwest::Response> {
        let mut builder = self
            .http
            .post(&ctx.url)
            .header(AUTHORIZATION, self.config.bearer())
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        if ctx.stream {
            builder = builder.header(ACCEPT, "text/event-stream");
        }
        for it in &self.interceptors {
            builder = it.on_before_send(ctx, builder)?;
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = LlmError::from(e);
                self.notify_error(ctx, &err);
                return Err(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let err = classify_http_error(status.as_u16(), &text);
            self.notify_error(ctx, &err);
            return Err(err);
        }
        for it in &self.interceptors {
            it.on_response(ctx, status);
        }
        Ok(response)
    }

    /// Issue a streaming request and reduce its body.
    ///
    /// Non-2xx answers are returned as errors before any line is read.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<Reduction> {
        self.run_stream(request, StreamingChatReducer::new()).await
    }

    /// Like [`stream_chat`](Self::stream_chat), forwarding each content
    /// fragment to `sink` as it arrives.
    pub async fn stream_chat_with(
        &self,
        request: &ChatRequest,
        sink: impl FnMut(&str) + Send + 'static,
    ) -> Result<Reduction> {
        self.run_stream(request, StreamingChatReducer::with_delta_sink(sink))
            .await
    }

    async fn run_stream(
        &self,
        request: &ChatRequest,
        reducer: StreamingChatReducer,
    ) -> Result<Reduction> {
        let ctx = self.context(request.model(), true);
        let response = self.post(&ctx, request).await?;

        let interceptors = self.interceptors.clone();
        let line_ctx = ctx.clone();
        let lines = body_lines(response.bytes_stream()).inspect(move |item| {
            if let Ok(line) = item {
                for it in &interceptors {
                    it.on_stream_line(&line_ctx, line);
                }
            }
        });

        match reducer.reduce_stream(lines).await {
            Ok(reduction) => {
                tracing::debug!(
                    target: "llmcall::client",
                    chars = reduction.content.len(),
                    usage = reduction.usage.is_some(),
                    "stream reduced"
                );
                Ok(reduction)
            }
            Err(err) => {
                self.notify_error(&ctx, &err);
                Err(err)
            }
        }
    }

    /// Streaming call whose failures are kept as a tagged outcome.
    pub async fn send(&self, request: &ChatRequest) -> ChatOutcome {
        self.stream_chat(request).await.into()
    }

    /// [`send`](Self::send) with a delta sink.
    pub async fn send_with(
        &self,
        request: &ChatRequest,
        sink: impl FnMut(&str) + Send + 'static,
    ) -> ChatOutcome {
        self.stream_chat_with(request, sink).await.into()
    }

    /// Non-streaming completion, returning the first choice.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let ctx = self.context(&request.model, false);
        let response = self.post(&ctx, request).await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| LlmError::ParseError(format!("invalid completion body: {e}")))?;
        // OpenRouter reports some upstream failures with a 200 and an error envelope.
        if value.get("error").is_some() && value.get("choices").is_none() {
            return Err(classify_http_error(status, &text));
        }

        let parsed: CompletionResponse = serde_json::from_value(value)
            .map_err(|e| LlmError::ParseError(format!("unexpected completion shape: {e}")))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ParseError("completion has no choices".to_string()))?;

        Ok(Completion {
            message: choice.message,
            finish_reason: choice.finish_reason,
            usage: parsed.usage,
        })
    }
}
