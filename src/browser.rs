//! Result browsing: merge rows from either sink, filter, export.

use serde::Serialize;
use thiserror::Error;

use crate::record::{ResultRecord, StoredRecord};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("export was not valid UTF-8")]
    Utf8,
}

/// Unified row over both sinks. Local rows leave the remote-only columns
/// empty; remote rows carry their storage-assigned `doc_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowseRow {
    pub doc_id: String,
    pub id: String,
    pub model: String,
    pub prompt: String,
    pub response: String,
    pub time_seconds: f64,
    pub timestamp: String,
    pub date: String,
}

impl From<&ResultRecord> for BrowseRow {
    fn from(record: &ResultRecord) -> Self {
        Self {
            doc_id: String::new(),
            id: String::new(),
            model: record.model.clone(),
            prompt: record.prompt.clone(),
            response: record.response.clone(),
            time_seconds: record.time_seconds,
            timestamp: String::new(),
            date: record.current_date.clone(),
        }
    }
}

impl From<&StoredRecord> for BrowseRow {
    fn from(stored: &StoredRecord) -> Self {
        Self {
            doc_id: stored.doc_id.clone(),
            id: stored.record.id.clone(),
            model: stored.record.model.clone(),
            prompt: stored.record.prompt.clone(),
            response: stored.record.response.clone(),
            time_seconds: stored.record.time_seconds,
            timestamp: stored.record.timestamp.clone(),
            date: stored.record.date.clone(),
        }
    }
}

/// Exact-match filter on `date` and `model`. An empty criteria list passes
/// everything: selecting no dates means "all dates", as in the download UI.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub dates: Vec<String>,
    pub models: Vec<String>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.models.is_empty()
    }

    fn matches(&self, row: &BrowseRow) -> bool {
        let date_ok = self.dates.is_empty() || self.dates.iter().any(|d| *d == row.date);
        let model_ok = self.models.is_empty() || self.models.iter().any(|m| *m == row.model);
        date_ok && model_ok
    }

    fn matches_local(&self, record: &ResultRecord) -> bool {
        let date_ok =
            self.dates.is_empty() || self.dates.iter().any(|d| *d == record.current_date);
        let model_ok = self.models.is_empty() || self.models.iter().any(|m| *m == record.model);
        date_ok && model_ok
    }
}

/// Merge rows from both sources by simple concatenation. There is no
/// cross-sink deduplication: a record that reached both sinks appears twice
/// when both are combined, which is accepted behavior.
pub fn merge(local: &[ResultRecord], remote: &[StoredRecord]) -> Vec<BrowseRow> {
    local
        .iter()
        .map(BrowseRow::from)
        .chain(remote.iter().map(BrowseRow::from))
        .collect()
}

/// Apply a filter, preserving the rows' relative order from the merged
/// source.
pub fn filter_rows(rows: &[BrowseRow], filter: &RecordFilter) -> Vec<BrowseRow> {
    rows.iter()
        .filter(|row| filter.matches(row))
        .cloned()
        .collect()
}

/// Filter local records directly, without lifting them into [`BrowseRow`].
/// Dates match against `current_date`; order is preserved.
pub fn filter_records(records: &[ResultRecord], filter: &RecordFilter) -> Vec<ResultRecord> {
    records
        .iter()
        .filter(|record| filter.matches_local(record))
        .cloned()
        .collect()
}

/// Render merged rows as a delimited table for download.
pub fn to_csv(rows: &[BrowseRow]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|_| ExportError::Utf8)
}

/// Render local records with the historical local schema
/// (`model,prompt,response,time_seconds,current_date`), so a local-only
/// export stays column-compatible with previously exported files.
pub fn to_local_csv(records: &[ResultRecord]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|_| ExportError::Utf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RemoteRecord;

    fn local(model: &str, date: &str) -> ResultRecord {
        let mut record = ResultRecord::new(model, "p", "r", 0.1);
        record.current_date = date.to_string();
        record
    }

    fn remote(doc_id: &str, model: &str, date: &str) -> StoredRecord {
        StoredRecord {
            doc_id: doc_id.to_string(),
            record: RemoteRecord {
                id: format!("id-{doc_id}"),
                model: model.to_string(),
                prompt: "p".to_string(),
                response: "r".to_string(),
                time_seconds: 0.2,
                timestamp: "2026-01-01T00:00:00Z".to_string(),
                date: date.to_string(),
            },
        }
    }

    #[test]
    fn merge_concatenates_local_then_remote() {
        let rows = merge(
            &[local("a", "2026-01-01")],
            &[remote("d1", "b", "2026-01-02")],
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].model, "a");
        assert_eq!(rows[0].doc_id, "");
        assert_eq!(rows[1].model, "b");
        assert_eq!(rows[1].doc_id, "d1");
    }

    #[test]
    fn duplicates_across_sinks_are_kept() {
        let rows = merge(
            &[local("a", "2026-01-01")],
            &[remote("d1", "a", "2026-01-01")],
        );
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn date_filter_returns_exactly_matching_rows_in_order() {
        let rows = merge(
            &[local("a", "2026-01-01"), local("b", "2026-01-02")],
            &[
                remote("d1", "c", "2026-01-01"),
                remote("d2", "d", "2026-01-03"),
            ],
        );
        let filtered = filter_rows(
            &rows,
            &RecordFilter {
                dates: vec!["2026-01-01".to_string()],
                models: vec![],
            },
        );
        let models: Vec<&str> = filtered.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(models, vec!["a", "c"]);
    }

    #[test]
    fn combined_filters_intersect() {
        let rows = merge(
            &[local("a", "2026-01-01"), local("a", "2026-01-02")],
            &[],
        );
        let filtered = filter_rows(
            &rows,
            &RecordFilter {
                dates: vec!["2026-01-02".to_string()],
                models: vec!["a".to_string()],
            },
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].date, "2026-01-02");
    }

    #[test]
    fn empty_filter_passes_everything() {
        let rows = merge(&[local("a", "2026-01-01")], &[]);
        assert_eq!(filter_rows(&rows, &RecordFilter::default()).len(), 1);
    }

    #[test]
    fn local_export_keeps_the_historical_schema() {
        let records = vec![local("a", "2026-01-01"), local("b", "2026-01-02")];
        let csv = to_local_csv(&records).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "model,prompt,response,time_seconds,current_date"
        );
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn filter_records_matches_date_and_model_in_order() {
        let records = vec![
            local("a", "2026-01-01"),
            local("b", "2026-01-02"),
            local("a", "2026-01-02"),
        ];
        let filtered = filter_records(
            &records,
            &RecordFilter {
                dates: vec!["2026-01-02".to_string()],
                models: vec![],
            },
        );
        let models: Vec<&str> = filtered.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(models, vec!["b", "a"]);
    }

    #[test]
    fn csv_export_has_one_header_and_all_rows() {
        let rows = merge(
            &[local("a", "2026-01-01")],
            &[remote("d1", "b", "2026-01-02")],
        );
        let csv = to_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "doc_id,id,model,prompt,response,time_seconds,timestamp,date"
        );
        assert_eq!(lines.count(), 2);
    }
}
