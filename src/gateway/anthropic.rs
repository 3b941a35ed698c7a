//! Adapter for the Anthropic Messages API.
//!
//! Anthropic does not speak the chat-completions dialect: auth goes through
//! `x-api-key`, system prompts ride a top-level field, and content comes back
//! as typed blocks.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::error::ProviderError;
use super::types::{ChatRequest, ChatResponse, Role};
use super::ChatBackend;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default max_tokens: the Messages API requires the field on every request.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic Messages API adapter.
#[derive(Debug, Clone)]
pub struct AnthropicAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl AnthropicAdapter {
    /// Create with custom configuration. `base_url` is the API root, e.g.
    /// "https://api.anthropic.com/v1".
    pub fn with_config(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        let base_url = base_url.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let key_value = HeaderValue::from_str(&api_key)
            .map_err(|_| ProviderError::config("Invalid API key format"))?;
        headers.insert("x-api-key", key_value);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.base_url)
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Serialize)]
struct MessagesApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesApiResponse {
    content: Option<Vec<ContentBlock>>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: Option<String>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
}

// =============================================================================
// CHAT BACKEND IMPL
// =============================================================================

#[async_trait]
impl ChatBackend for AnthropicAdapter {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let start = Instant::now();

        // System messages move to the top-level field; the rest keep their turn.
        let mut system: Option<String> = None;
        let mut messages = Vec::new();
        for m in &req.messages {
            match m.role {
                Role::System => system = Some(m.content.clone()),
                Role::User => messages.push(ApiMessage {
                    role: "user",
                    content: m.content.clone(),
                }),
                Role::Assistant => messages.push(ApiMessage {
                    role: "assistant",
                    content: m.content.clone(),
                }),
            }
        }

        let api_req = MessagesApiRequest {
            model: &req.model_id,
            messages,
            max_tokens: req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: req.temperature,
            system,
        };

        let response = self
            .client
            .post(self.messages_url())
            .json(&api_req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(parsed) = serde_json::from_str::<MessagesApiResponse>(&body) {
                if let Some(error) = parsed.error {
                    return Err(ProviderError::provider_with_status(
                        "anthropic",
                        error.message.unwrap_or_default(),
                        status.as_u16(),
                    ));
                }
            }
            return Err(ProviderError::provider_with_status(
                "anthropic",
                format!("HTTP {}", status.as_u16()),
                status.as_u16(),
            ));
        }

        let parsed: MessagesApiResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::provider("anthropic", format!("Invalid JSON: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(ProviderError::provider(
                "anthropic",
                error.message.unwrap_or_default(),
            ));
        }

        let content = parsed
            .content
            .unwrap_or_default()
            .into_iter()
            .find(|b| b.block_type.as_deref() == Some("text"))
            .and_then(|b| b.text)
            .ok_or_else(|| ProviderError::provider("anthropic", "No text content in response"))?;

        Ok(ChatResponse {
            content,
            latency: start.elapsed(),
        })
    }
}
