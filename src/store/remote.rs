//! Remote document sink: trait, errors, and the fail-closed handle.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::record::{RemoteRecord, StoredRecord};

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The sink was never initialized (credentials absent). No write is
    /// attempted in this state.
    #[error("remote store not available")]
    Unavailable,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote store error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed remote document: {0}")]
    Decode(String),
}

/// Bulk-write/bulk-read document collection. Retrieval order is unspecified;
/// callers sort explicitly when they need determinism.
#[async_trait]
pub trait DocStore: Send + Sync {
    async fn add(&self, record: &RemoteRecord) -> Result<(), RemoteError>;
    async fn scan_all(&self) -> Result<Vec<StoredRecord>, RemoteError>;
}

/// Operator-facing handle over an optional backend.
///
/// Initialization is explicit: a handle built without a backend is disabled,
/// and using it fails closed, with `add` reporting failure without attempting
/// any network call. Post-initialization write failures are logged and swallowed;
/// a remote write must never abort a run.
#[derive(Clone)]
pub struct RemoteStore {
    backend: Option<Arc<dyn DocStore>>,
}

impl RemoteStore {
    pub fn new(backend: Arc<dyn DocStore>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Best-effort single-document write. Returns whether the write landed.
    pub async fn add(&self, record: &RemoteRecord) -> bool {
        let Some(backend) = &self.backend else {
            debug!("remote store disabled; skipping write");
            return false;
        };
        match backend.add(record).await {
            Ok(()) => true,
            Err(err) => {
                warn!(model = %record.model, error = %err, "remote write failed");
                false
            }
        }
    }

    /// Full scan of the collection. Errors here do propagate: a browse that
    /// cannot reach the store is something the operator must see.
    pub async fn scan_all(&self) -> Result<Vec<StoredRecord>, RemoteError> {
        match &self.backend {
            None => Err(RemoteError::Unavailable),
            Some(backend) => backend.scan_all().await,
        }
    }
}
