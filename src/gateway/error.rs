//! Error types for the chat gateway.

use thiserror::Error;

/// Errors that can occur when calling a chat backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Invalid request - permanent error.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Provider-side error (non-2xx status, malformed body, API error object).
    #[error("{provider} error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
        http_status: Option<u16>,
    },

    /// HTTP/network error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error (missing API key, bad header value, etc.).
    #[error("configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a provider error.
    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
            http_status: None,
        }
    }

    /// Create a provider error carrying the HTTP status.
    pub fn provider_with_status(
        provider: &'static str,
        message: impl Into<String>,
        status: u16,
    ) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
            http_status: Some(status),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Get a short error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Provider { .. } => "provider_error",
            Self::Http(_) => "http_error",
            Self::Config(_) => "config_error",
        }
    }
}
