//! Model registry: named invokers built once from configuration.
//!
//! The registry is an explicit value passed by reference into the harness,
//! never ambient global state, so tests can substitute fake invokers freely.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::gateway::{AnthropicAdapter, ChatBackend, ModelInvoker, OpenAiCompatAdapter};
use crate::secrets::Secrets;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const XAI_BASE_URL: &str = "https://api.x.ai/v1";
const GEMINI_COMPAT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

const BACKEND_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error(transparent)]
    Provider(#[from] crate::gateway::ProviderError),
}

/// Mapping from display name to invoker, in insertion order. Immutable once
/// built; a run selects a subset of names from it.
pub struct ModelRegistry {
    entries: Vec<(String, ModelInvoker)>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build the standard catalog from configured vendor keys. A model is
    /// registered only when its vendor key is present, so a partially
    /// configured environment yields a smaller catalog rather than an error.
    pub fn from_secrets(secrets: &Secrets) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        if let Some(key) = &secrets.openai_api_key {
            let backend: Arc<dyn ChatBackend> = Arc::new(OpenAiCompatAdapter::with_config(
                "openai",
                key,
                OPENAI_BASE_URL,
                BACKEND_TIMEOUT,
            )?);
            registry.register("gpt-4o-mini", ModelInvoker::new(backend, "gpt-4o-mini"));
        }

        if let Some(key) = &secrets.anthropic_api_key {
            let backend: Arc<dyn ChatBackend> = Arc::new(AnthropicAdapter::with_config(
                key,
                ANTHROPIC_BASE_URL,
                BACKEND_TIMEOUT,
            )?);
            registry.register(
                "claude-sonnet",
                ModelInvoker::new(backend, "claude-3-5-sonnet-20240620"),
            );
        }

        if let Some(key) = &secrets.gemini_api_key {
            let backend: Arc<dyn ChatBackend> = Arc::new(OpenAiCompatAdapter::with_config(
                "gemini",
                key,
                GEMINI_COMPAT_BASE_URL,
                BACKEND_TIMEOUT,
            )?);
            registry.register(
                "gemini-1.5-pro",
                ModelInvoker::new(backend, "gemini-1.5-pro"),
            );
        }

        if let Some(key) = &secrets.xai_api_key {
            let backend: Arc<dyn ChatBackend> = Arc::new(OpenAiCompatAdapter::with_config(
                "xai",
                key,
                XAI_BASE_URL,
                BACKEND_TIMEOUT,
            )?);
            registry.register("grok-2-latest", ModelInvoker::new(backend, "grok-2-latest"));
        }

        if let Some(key) = &secrets.groq_api_key {
            let backend: Arc<dyn ChatBackend> = Arc::new(OpenAiCompatAdapter::with_config(
                "groq",
                key,
                GROQ_BASE_URL,
                BACKEND_TIMEOUT,
            )?);
            registry.register(
                "llama",
                ModelInvoker::new(Arc::clone(&backend), "llama-3.3-70b-versatile"),
            );
            registry.register(
                "deepseek",
                ModelInvoker::new(backend, "deepseek-r1-distill-llama-70b"),
            );
        }

        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, invoker: ModelInvoker) {
        self.entries.push((name.into(), invoker));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Registered names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ModelInvoker> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, invoker)| invoker)
    }

    /// Resolve a selection, preserving the caller's order. Unknown names are
    /// rejected up front rather than silently skipped mid-run. The returned
    /// selection borrows only the registry, never `names`.
    pub fn select<'a>(
        &'a self,
        names: &[String],
    ) -> Result<Vec<(&'a str, &'a ModelInvoker)>, RegistryError> {
        names
            .iter()
            .map(|name| {
                self.entries
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(n, invoker)| (n.as_str(), invoker))
                    .ok_or_else(|| RegistryError::UnknownModel(name.clone()))
            })
            .collect()
    }

    /// The whole catalog as a selection, in registration order.
    pub fn select_all(&self) -> Vec<(&str, &ModelInvoker)> {
        self.entries
            .iter()
            .map(|(name, invoker)| (name.as_str(), invoker))
            .collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{ChatRequest, ChatResponse, ProviderError};

    struct Echo;

    #[async_trait::async_trait]
    impl ChatBackend for Echo {
        async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            Ok(ChatResponse {
                content: req.messages[0].content.clone(),
                latency: Duration::from_millis(0),
            })
        }
    }

    fn registry_with(names: &[&str]) -> ModelRegistry {
        let backend: Arc<dyn ChatBackend> = Arc::new(Echo);
        let mut registry = ModelRegistry::new();
        for name in names {
            registry.register(*name, ModelInvoker::new(Arc::clone(&backend), *name));
        }
        registry
    }

    #[test]
    fn select_preserves_caller_order() {
        let registry = registry_with(&["a", "b", "c"]);
        let selection = registry
            .select(&["c".to_string(), "a".to_string()])
            .unwrap();
        let names: Vec<&str> = selection.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["c", "a"]);
    }

    #[test]
    fn select_rejects_unknown_name() {
        let registry = registry_with(&["a"]);
        let err = registry.select(&["nope".to_string()]).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownModel(name) if name == "nope"));
    }

    #[test]
    fn catalog_tracks_configured_vendors_only() {
        let secrets = Secrets::from_lookup(|key| match key {
            "GROQ_API_KEY" => Some("gsk-test".to_string()),
            _ => None,
        });
        let registry = ModelRegistry::from_secrets(&secrets).unwrap();
        assert_eq!(registry.names(), vec!["llama", "deepseek"]);
    }
}
