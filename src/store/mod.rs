//! Result persistence: a local append-only flat file and a remote document
//! collection. Two independent capability interfaces with no shared
//! transaction: they are expected to diverge (e.g. remote write lands,
//! process dies before the local flush) and callers tolerate that.

pub mod firestore;
pub mod local;
pub mod remote;

pub use firestore::FirestoreStore;
pub use local::{CsvResultStore, LocalSink, StoreError};
pub use remote::{DocStore, RemoteError, RemoteStore};
