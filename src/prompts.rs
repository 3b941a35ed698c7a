//! Prompt set loading.
//!
//! Input is a delimited table with a required, case-sensitive `Prompt`
//! column; extra columns are ignored. Loaded once per run and immutable
//! afterwards; iteration order is file order.

use std::path::Path;

use thiserror::Error;

/// Header name the input file must carry. Case-sensitive on purpose: a file
/// with `prompt` instead of `Prompt` is a different schema, not a typo we
/// guess at.
pub const PROMPT_COLUMN: &str = "Prompt";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt file {path} has no '{PROMPT_COLUMN}' column")]
    MissingPromptColumn { path: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered, immutable sequence of prompt strings keyed by row position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    prompts: Vec<String>,
}

impl PromptSet {
    pub fn new(prompts: Vec<String>) -> Self {
        Self { prompts }
    }

    /// Load from a CSV file. Empty prompt cells are kept as empty strings;
    /// they are passed through to backends unmodified like any other prompt.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, PromptError> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)?;

        let prompt_idx = reader
            .headers()?
            .iter()
            .position(|h| h == PROMPT_COLUMN)
            .ok_or_else(|| PromptError::MissingPromptColumn {
                path: path.display().to_string(),
            })?;

        let mut prompts = Vec::new();
        for row in reader.records() {
            let row = row?;
            prompts.push(row.get(prompt_idx).unwrap_or_default().to_string());
        }
        Ok(Self { prompts })
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prompts.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PromptSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
