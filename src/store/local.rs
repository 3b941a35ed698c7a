//! Local append-only CSV store for result records.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::record::ResultRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only local sink. `load_all` returning `None` means the file does
/// not exist yet, a normal state for a fresh environment rather than an error.
pub trait LocalSink: Send + Sync {
    fn append(&self, records: &[ResultRecord]) -> Result<(), StoreError>;
    fn load_all(&self) -> Result<Option<Vec<ResultRecord>>, StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Flat-file CSV store. The first-ever append creates the file with a header
/// row; every later append writes rows only, assuming schema stability
/// across the file's whole history. Rows are never rewritten; file row order
/// is the concatenation of each run's traversal order.
#[derive(Debug, Clone)]
pub struct CsvResultStore {
    path: PathBuf,
}

impl CsvResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl LocalSink for CsvResultStore {
    fn append(&self, records: &[ResultRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // A pre-created zero-byte file still needs its header.
        let fresh = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(fresh)
            .from_writer(file);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn load_all(&self) -> Result<Option<Vec<ResultRecord>>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(Some(records))
    }

    fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, CsvResultStore) {
        let dir = tempfile::tempdir().expect("create tempdir");
        let store = CsvResultStore::new(dir.path().join("results.csv"));
        (dir, store)
    }

    fn record(model: &str, response: &str) -> ResultRecord {
        ResultRecord::new(model, "p", response, 0.1)
    }

    #[test]
    fn append_empty_is_a_noop() {
        let (_dir, store) = temp_store();
        store.append(&[]).unwrap();
        assert!(!store.exists());
        assert!(store.load_all().unwrap().is_none());
    }

    #[test]
    fn successive_appends_share_one_header() {
        let (_dir, store) = temp_store();
        store.append(&[record("a", "r1")]).unwrap();
        store.append(&[record("b", "r2")]).unwrap();

        let rows = store.load_all().unwrap().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].model, "a");
        assert_eq!(rows[1].model, "b");

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let header_count = raw.lines().filter(|l| l.starts_with("model,")).count();
        assert_eq!(header_count, 1, "file:\n{raw}");
    }

    #[test]
    fn append_to_zero_byte_file_still_writes_header() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "").unwrap();

        store.append(&[record("a", "r1")]).unwrap();
        let rows = store.load_all().unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].model, "a");

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("model,"), "file:\n{raw}");
    }

    #[test]
    fn clear_then_append_recreates_with_fresh_header() {
        let (_dir, store) = temp_store();
        store.append(&[record("a", "r1")]).unwrap();
        store.clear().unwrap();
        assert!(store.load_all().unwrap().is_none());

        store.append(&[record("b", "r2")]).unwrap();
        let rows = store.load_all().unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].model, "b");
    }

    #[test]
    fn commas_and_newlines_in_fields_survive_round_trip() {
        let (_dir, store) = temp_store();
        let tricky = ResultRecord::new("m", "a, \"quoted\" prompt\nwith newline", "ok", 1.0);
        store.append(std::slice::from_ref(&tricky)).unwrap();
        let rows = store.load_all().unwrap().unwrap();
        assert_eq!(rows[0].prompt, tricky.prompt);
    }
}
