//! Digest flow - Turn a match set into LLM-ready context
//!
//! The digest is a fixed-width preview of each paper. Downstream consumers
//! rely on the exact layout and on the raw 300-character cut, so neither is
//! configurable.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::backends::corpus::{CorpusSearcher, SearchOptions};
use crate::core::model::{MatchSet, Paper};
use crate::core::tokenizer::{count_tokens, TokenModel};
use crate::core::util::truncate_chars;

/// Digest returned for an empty match set
pub const NO_RESULTS: &str = "No relevant papers found.";

/// Title shown when a paper has none
pub const UNTITLED: &str = "Untitled";

/// Abstract preview length, in characters
pub const PREVIEW_CHARS: usize = 300;

/// Marker appended after every abstract preview
pub const ELLIPSIS: &str = "...";

/// Render `matches` as one paragraph per paper, in match-set order
pub fn summarize(matches: &MatchSet) -> String {
    if matches.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut digest = String::new();
    for (i, paper) in matches.iter().enumerate() {
        push_paragraph(&mut digest, i + 1, paper);
    }
    digest
}

fn push_paragraph(out: &mut String, index: usize, paper: &Paper) {
    let title = if paper.title.trim().is_empty() {
        UNTITLED
    } else {
        paper.title.as_str()
    };
    let (preview, _) = truncate_chars(&paper.abstract_text, PREVIEW_CHARS);

    out.push_str(&format!(
        "Paper {}: {}\nSummary: {}{}\n\n",
        index, title, preview, ELLIPSIS
    ));
}

/// Wrap a digest and the user's question into the prompt sent to the model
pub fn context_prompt(digest: &str, question: &str) -> String {
    format!("Context:\n{}\n\nQuestion: {}", digest, question)
}

/// Size of a digest as seen by the downstream model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestStats {
    pub papers: usize,
    pub chars: usize,
    pub tokens: usize,
    pub token_model: String,
}

impl DigestStats {
    pub fn measure(matches: &MatchSet, text: &str, model: TokenModel) -> Self {
        Self {
            papers: matches.len(),
            chars: text.chars().count(),
            tokens: count_tokens(text, model),
            token_model: model.to_string(),
        }
    }
}

/// Run the digest command
pub fn run_digest(
    dataset: &Path,
    query: &str,
    options: &SearchOptions,
    as_prompt: bool,
    stats_model: Option<TokenModel>,
) -> Result<()> {
    let searcher = CorpusSearcher::new(dataset).with_workers(options.workers);
    let matches = searcher.search(query, options.max_results)?;
    let digest = summarize(&matches);
    let output = if as_prompt {
        context_prompt(&digest, query.trim())
    } else {
        digest
    };

    if let Some(model) = stats_model {
        let stats = DigestStats::measure(&matches, &output, model);
        eprintln!("Digest statistics:");
        eprintln!("   Papers: {}", stats.papers);
        eprintln!("   Characters: {}", stats.chars);
        eprintln!("   Tokens: {} (model: {})", stats.tokens, stats.token_model);
        eprintln!();
    }

    println!("{}", output);
    Ok(())
}
