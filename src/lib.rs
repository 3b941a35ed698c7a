#![forbid(unsafe_code)]

//! # sentio-harness
//!
//! Batch-comparison harness for LLM chat backends: load a prompt set, run it
//! across a configurable selection of models a configurable number of times,
//! and persist every response with its latency: incrementally to a remote
//! document collection and, once the run completes, to a local append-only
//! CSV. Accumulated results can be browsed, filtered by date/model, and
//! exported.
//!
//! The run loop is deliberately sequential: one blocking backend call at a
//! time, failures downgraded to `"Error: ..."` records so a single bad cell
//! never aborts a run. The two sinks are independent and non-transactional;
//! see the `harness` module docs for the durability asymmetry this implies.

pub mod browser;
pub mod gateway;
pub mod harness;
pub mod prompts;
pub mod record;
pub mod registry;
pub mod secrets;
pub mod store;

pub use gateway::{ChatBackend, ModelInvoker};
pub use harness::{Harness, HarnessError, NoopProgress, ProgressObserver};
pub use prompts::PromptSet;
pub use record::{RemoteRecord, ResultRecord, StoredRecord, ERROR_PREFIX};
pub use registry::ModelRegistry;
pub use secrets::Secrets;
pub use store::{CsvResultStore, DocStore, FirestoreStore, LocalSink, RemoteStore};
