//! Chat gateway: vendor adapters behind one trait, plus the timing-and-catch
//! invoker the run harness drives.

pub mod anthropic;
pub mod error;
pub mod openai;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

pub use anthropic::AnthropicAdapter;
pub use error::ProviderError;
pub use openai::OpenAiCompatAdapter;
pub use types::*;

/// Trait for chat completion backends.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}

/// Uniform call-and-time wrapper over one backend + model id.
///
/// `invoke` never fails: any backend error is downgraded to an
/// `"Error: ..."` response with zero elapsed time, so a single bad cell can
/// never abort an enclosing run. One attempt per call, no retry.
#[derive(Clone)]
pub struct ModelInvoker {
    backend: Arc<dyn ChatBackend>,
    model_id: String,
}

impl ModelInvoker {
    pub fn new(backend: Arc<dyn ChatBackend>, model_id: impl Into<String>) -> Self {
        Self {
            backend,
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Send `prompt` as a single user turn. Returns the response text and the
    /// elapsed seconds measured around the backend call only (not request
    /// construction). On failure: `("Error: <message>", 0.0)`.
    pub async fn invoke(&self, prompt: &str) -> (String, f64) {
        let req = ChatRequest::single_turn(&self.model_id, prompt);
        let start = Instant::now();
        match self.backend.chat(&req).await {
            Ok(resp) => (resp.content, start.elapsed().as_secs_f64()),
            Err(err) => {
                tracing::warn!(model = %self.model_id, code = err.code(), "backend call failed");
                (format!("Error: {err}"), 0.0)
            }
        }
    }
}

impl std::fmt::Debug for ModelInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelInvoker")
            .field("model_id", &self.model_id)
            .finish_non_exhaustive()
    }
}
