//! Search error taxonomy
//!
//! Caller errors (`InvalidQuery`, `InvalidLimit`) and a missing corpus fail
//! before any line is read. `ScanFailure` is raised mid-scan and discards the
//! partial result. Malformed lines are not errors at all: they are logged and
//! skipped inside the scan.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Query is empty (or whitespace only) after normalization
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Result cap must be a positive integer
    #[error("invalid result limit: max_results must be at least 1")]
    InvalidLimit,

    /// Dataset file is missing, is not a regular file, or cannot be opened
    #[error("corpus unavailable at {}: {source}", .path.display())]
    CorpusUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O fault while streaming the dataset
    #[error("scan failed at {} (line {line}): {source}", .path.display())]
    ScanFailure {
        path: PathBuf,
        line: u64,
        #[source]
        source: io::Error,
    },
}

impl SearchError {
    pub(crate) fn invalid_query(reason: impl Into<String>) -> Self {
        SearchError::InvalidQuery {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, prefixed to CLI error messages
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::InvalidQuery { .. } => "INVALID_QUERY",
            SearchError::InvalidLimit => "INVALID_LIMIT",
            SearchError::CorpusUnavailable { .. } => "CORPUS_UNAVAILABLE",
            SearchError::ScanFailure { .. } => "SCAN_FAILURE",
        }
    }
}
