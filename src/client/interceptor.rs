//! HTTP Interceptor interfaces
//!
//! Interceptors observe outgoing requests, successful responses, failures
//! and the individual lines of streaming bodies. Hooks are best-effort and
//! should stay cheap.

use reqwest::StatusCode;

use crate::error::LlmError;

/// Context passed to interceptors describing the request.
#[derive(Clone, Debug)]
pub struct HttpRequestContext {
    pub url: String,
    pub model: String,
    pub stream: bool,
}

/// HTTP interceptor trait
pub trait HttpInterceptor: Send + Sync {
    /// Called before sending a request. Interceptors may add headers to the
    /// builder or return an error to short-circuit the request.
    fn on_before_send(
        &self,
        _ctx: &HttpRequestContext,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, LlmError> {
        Ok(builder)
    }

    /// Called after a 2xx response is received.
    fn on_response(&self, _ctx: &HttpRequestContext, _status: StatusCode) {}

    /// Called when sending, status classification or body reading fails.
    fn on_error(&self, _ctx: &HttpRequestContext, _error: &LlmError) {}

    /// Called for every line read from a streaming body.
    fn on_stream_line(&self, _ctx: &HttpRequestContext, _line: &str) {}
}

/// A simple logging interceptor backed by `tracing` (no sensitive data).
#[derive(Clone, Debug, Default)]
pub struct LoggingInterceptor;

impl HttpInterceptor for LoggingInterceptor {
    fn on_before_send(
        &self,
        ctx: &HttpRequestContext,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, LlmError> {
        tracing::debug!(target: "llmcall::http", url=%ctx.url, model=%ctx.model, stream=%ctx.stream, "sending request");
        Ok(builder)
    }

    fn on_response(&self, ctx: &HttpRequestContext, status: StatusCode) {
        tracing::debug!(target: "llmcall::http", url=%ctx.url, status=%status.as_u16(), "response received");
    }

    fn on_error(&self, ctx: &HttpRequestContext, error: &LlmError) {
        tracing::debug!(target: "llmcall::http", url=%ctx.url, stream=%ctx.stream, err=%error, "request error");
    }

    fn on_stream_line(&self, ctx: &HttpRequestContext, line: &str) {
        tracing::trace!(target: "llmcall::http", url=%ctx.url, len=line.len(), "stream line");
    }
}
