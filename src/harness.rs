//! Run orchestration: drive the repeat × model × prompt matrix to
//! completion and persist what comes out.
//!
//! Invocation is strictly sequential, one backend call in flight at a time,
//! no cancellation mid-run. The two sinks are written on different schedules
//! by design: every record goes to the remote store as it is produced
//! (best-effort), while the local file gets one append after the whole
//! matrix completes. An interrupted run therefore leaves its finished cells
//! in the remote store and nothing in the local file.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::gateway::ModelInvoker;
use crate::prompts::PromptSet;
use crate::record::ResultRecord;
use crate::store::{LocalSink, RemoteStore, StoreError};

#[derive(Debug, Error)]
pub enum HarnessError {
    /// The run finished but its output could not be flushed to the local
    /// file, a data-loss risk the operator must see immediately.
    #[error("failed to persist run results: {0}")]
    LocalFlush(#[from] StoreError),
}

/// Receives cumulative progress after each cell. `completed` is 1-indexed
/// and monotonically non-decreasing; `completed == total` on the final call.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);

    fn fraction(completed: usize, total: usize) -> f64
    where
        Self: Sized,
    {
        completed as f64 / total as f64
    }
}

/// Observer that discards progress. For non-interactive callers and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// The run orchestrator: owns the two sinks, borrows everything else.
pub struct Harness {
    local: Arc<dyn LocalSink>,
    remote: RemoteStore,
}

impl Harness {
    pub fn new(local: Arc<dyn LocalSink>, remote: RemoteStore) -> Self {
        Self { local, remote }
    }

    /// Run every selected model over every prompt, `repeat` times.
    ///
    /// Traversal order is fixed: repeat, then model (caller's selection
    /// order), then prompt (file order). Exactly one record is emitted per
    /// cell; backend failures arrive as `"Error: ..."` records, never as
    /// skips. An empty
    /// selection or prompt set returns an empty sequence and touches
    /// neither sink.
    pub async fn run(
        &self,
        prompts: &PromptSet,
        models: &[(&str, &ModelInvoker)],
        repeat: usize,
        observer: &dyn ProgressObserver,
    ) -> Result<Vec<ResultRecord>, HarnessError> {
        let total = repeat * models.len() * prompts.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        info!(
            repeat,
            models = models.len(),
            prompts = prompts.len(),
            total,
            "starting run"
        );

        let mut results = Vec::with_capacity(total);
        let mut completed = 0usize;

        for _ in 0..repeat {
            for (name, invoker) in models {
                for prompt in prompts.iter() {
                    let (response, elapsed) = invoker.invoke(prompt).await;
                    let record = ResultRecord::new(*name, prompt, response, elapsed);

                    // Per-record remote write, independent of the local
                    // flush below. Failure is already logged by the store.
                    self.remote.add(&record.to_remote()).await;

                    results.push(record);
                    completed += 1;
                    observer.on_progress(completed, total);
                }
            }
        }

        // Single local append for the whole run; its failure escalates.
        self.local.append(&results)?;
        info!(records = results.len(), "run complete");

        Ok(results)
    }
}
