//! Client and tool server configuration.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpListener;

use crate::error::{LlmError, Result};

/// OpenRouter's OpenAI-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Free model that supports tool calling on OpenRouter.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";
pub const DEFAULT_MAX_TOKENS: u32 = 10_000;

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const BASE_URL_ENV: &str = "LLMCALL_BASE_URL";
pub const MODEL_ENV: &str = "LLMCALL_MODEL";

/// Settings for talking to a chat completions endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer token; never logged
    pub api_key: SecretString,
    /// API root, `/chat/completions` is appended
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Whole-request timeout; `None` keeps the HTTP client default
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: None,
            connect_timeout: None,
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// A missing `OPENROUTER_API_KEY` is not an error here: the request goes
    /// out with an empty bearer token and the remote service rejects it.
    pub fn from_env() -> Self {
        let mut config = Self::new(std::env::var(API_KEY_ENV).unwrap_or_default());
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config = config.with_base_url(base_url);
        }
        if let Ok(model) = std::env::var(MODEL_ENV) {
            config = config.with_model(model);
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }
}

pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_TOOL_SERVER_PORT: u16 = 3030;

/// Bind address of the tool server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ToolServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_TOOL_SERVER_PORT,
        }
    }
}

impl ToolServerConfig {
    /// Default bind address with the port taken from `PORT` when set.
    pub fn from_env() -> Result<Self> {
        Self::default().with_port_var(std::env::var(PORT_ENV).ok())
    }

    fn with_port_var(mut self, raw: Option<String>) -> Result<Self> {
        if let Some(port) = raw {
            self.port = port.trim().parse().map_err(|_| {
                LlmError::ConfigurationError(format!("{PORT_ENV} is not a valid port: {port}"))
            })?;
        }
        Ok(self)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Bind the listening socket; `host` may be an IP address or a hostname.
    pub async fn bind(&self) -> Result<TcpListener> {
        TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                LlmError::ConfigurationError(format!(
                    "cannot bind {}:{}: {e}",
                    self.host, self.port
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_openrouter() {
        let config = ClientConfig::new("k");
        assert_eq!(
            config.chat_completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 10_000);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("k").with_base_url("http://localhost:8080/v1/");
        assert_eq!(
            config.chat_completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn api_key_is_redacted_in_debug() {
        let config = ClientConfig::new("sk-secret-value");
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret-value"));
        assert_eq!(config.bearer(), "Bearer sk-secret-value");
    }

    #[test]
    fn empty_key_is_accepted() {
        let config = ClientConfig::new("");
        assert!(!config.has_api_key());
        assert_eq!(config.bearer(), "Bearer ");
    }

    #[test]
    fn port_variable_overrides_default() {
        let config = ToolServerConfig::default()
            .with_port_var(Some(" 8080 ".to_string()))
            .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");

        let config = ToolServerConfig::default().with_port_var(None).unwrap();
        assert_eq!(config.port, DEFAULT_TOOL_SERVER_PORT);
    }

    #[test]
    fn invalid_port_variable_is_rejected() {
        let err = ToolServerConfig::default()
            .with_port_var(Some("http".to_string()))
            .unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(ref m) if m.contains("PORT")));
    }

    #[tokio::test]
    async fn binds_hostnames() {
        let listener = ToolServerConfig::default()
            .with_host("localhost")
            .with_port(0)
            .bind()
            .await
            .unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }
}
