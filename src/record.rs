//! Result records: the unit of persistence for one model × prompt cell.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix that marks a failed invocation. The response text itself is the
/// error channel; there is no separate flag in the persisted schema.
pub const ERROR_PREFIX: &str = "Error: ";

/// Today's date as an ISO calendar date string (local time).
pub fn current_date() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// One persisted outcome of invoking one model on one prompt.
///
/// Serde field names are exactly the local CSV header. Created once inside
/// the innermost run-loop iteration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub model: String,
    pub prompt: String,
    pub response: String,
    pub time_seconds: f64,
    /// Captured at record-creation time, not run start: a run spanning
    /// midnight emits mixed dates, which downstream date filtering relies on.
    pub current_date: String,
}

impl ResultRecord {
    pub fn new(
        model: impl Into<String>,
        prompt: impl Into<String>,
        response: impl Into<String>,
        time_seconds: f64,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            response: response.into(),
            time_seconds,
            current_date: current_date(),
        }
    }

    /// Whether the response carries the failure tag. A legitimate model
    /// response that happens to begin with the literal text "Error: " is
    /// indistinguishable from a real failure; the prefix is not reserved.
    pub fn is_error(&self) -> bool {
        self.response.starts_with(ERROR_PREFIX)
    }

    /// Derive the remote-sink document for this record, assigning a fresh
    /// id and capture timestamp.
    pub fn to_remote(&self) -> RemoteRecord {
        RemoteRecord {
            id: Uuid::new_v4().to_string(),
            model: self.model.clone(),
            prompt: self.prompt.clone(),
            response: self.response.clone(),
            time_seconds: self.time_seconds,
            timestamp: Utc::now().to_rfc3339(),
            date: self.current_date.clone(),
        }
    }
}

/// Document shape written to the remote collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    pub model: String,
    pub prompt: String,
    pub response: String,
    pub time_seconds: f64,
    pub timestamp: String,
    pub date: String,
}

/// A remote document as read back, with its storage-assigned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub doc_id: String,
    pub record: RemoteRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_prefix_is_the_signal() {
        let failed = ResultRecord::new("m", "p", "Error: connection refused", 0.0);
        assert!(failed.is_error());

        let ok = ResultRecord::new("m", "p", "All good", 1.2);
        assert!(!ok.is_error());
    }

    #[test]
    fn remote_records_get_distinct_ids() {
        let record = ResultRecord::new("m", "p", "r", 0.5);
        let a = record.to_remote();
        let b = record.to_remote();
        assert_ne!(a.id, b.id);
        assert_eq!(a.date, record.current_date);
        assert_eq!(a.time_seconds, 0.5);
    }
}
