//! paperscan - Bounded concurrent search over JSONL paper corpora
//!
//! Two entry points make up the library surface:
//! - [`search`]: scan a dataset for a query, returning at most `max_results` papers
//! - [`summarize`]: render the matches as a plain-text digest
//!
//! ```no_run
//! use std::path::Path;
//!
//! let matches = paperscan::search("graph neural", Path::new("arxiv.jsonl"), 5)?;
//! println!("{}", paperscan::summarize(&matches));
//! # Ok::<(), paperscan::SearchError>(())
//! ```

pub mod backends;
pub mod cli;
pub mod core;
pub mod flows;

pub use crate::backends::corpus::{search, CorpusSearcher, ScanStats, SearchOptions};
pub use crate::core::error::SearchError;
pub use crate::core::model::{Authors, MatchSet, Paper, Query};
pub use crate::flows::summary::{context_prompt, summarize};
