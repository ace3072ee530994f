//! Token counting for digest budgeting
//!
//! Digests are pasted into an LLM prompt downstream, so their size is
//! reported in tokens as well as characters. BPE encodings come from
//! tiktoken; a heuristic estimate is available when exact counts are not
//! worth the encoder load.

use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;
use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};

/// Supported encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenModel {
    /// cl100k_base (GPT-4 family; close enough for Llama-style chat models)
    #[default]
    Cl100k,
    /// o200k_base (GPT-4o family)
    O200k,
    /// Character-class estimate, no encoder
    Heuristic,
}

impl TokenModel {
    fn bpe(&self) -> Option<&'static CoreBPE> {
        match self {
            TokenModel::Cl100k => CL100K_BPE.as_ref().ok(),
            TokenModel::O200k => O200K_BPE.as_ref().ok(),
            TokenModel::Heuristic => None,
        }
    }

    pub fn available_models() -> &'static [&'static str] {
        &["cl100k", "o200k", "heuristic"]
    }
}

impl fmt::Display for TokenModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenModel::Cl100k => "cl100k",
            TokenModel::O200k => "o200k",
            TokenModel::Heuristic => "heuristic",
        };
        f.write_str(name)
    }
}

impl FromStr for TokenModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k" | "cl100k_base" | "gpt4" | "gpt-4" | "llama3" | "default" => {
                Ok(TokenModel::Cl100k)
            }
            "o200k" | "o200k_base" | "gpt4o" | "gpt-4o" => Ok(TokenModel::O200k),
            "heuristic" | "fast" | "estimate" => Ok(TokenModel::Heuristic),
            _ => Err(format!(
                "Unknown token model: {}. Available: {}",
                s,
                TokenModel::available_models().join(", ")
            )),
        }
    }
}

// Loaded once on first use
static CL100K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| cl100k_base().map_err(|e| format!("Failed to load cl100k_base: {}", e)));

static O200K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| o200k_base().map_err(|e| format!("Failed to load o200k_base: {}", e)));

/// Load the encoder for `model`, reporting why it is unusable
pub fn check_encoding(model: TokenModel) -> Result<(), String> {
    match model {
        TokenModel::Heuristic => Ok(()),
        TokenModel::Cl100k => CL100K_BPE.as_ref().map(|_| ()).map_err(Clone::clone),
        TokenModel::O200k => O200K_BPE.as_ref().map(|_| ()).map_err(Clone::clone),
    }
}

/// Count tokens in `text`, falling back to the heuristic if the encoder failed to load
pub fn count_tokens(text: &str, model: TokenModel) -> usize {
    if text.is_empty() {
        return 0;
    }

    match model.bpe() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => estimate_tokens_heuristic(text),
    }
}

/// Rough estimate tuned for English prose with some math and punctuation.
///
/// ASCII letters/digits/whitespace run about 4 chars per token, punctuation
/// about 2, and other scripts about 1.5.
pub fn estimate_tokens_heuristic(text: &str) -> usize {
    let mut plain = 0usize;
    let mut punct = 0usize;
    let mut other = 0usize;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c.is_ascii_whitespace() {
            plain += 1;
        } else if c.is_ascii() {
            punct += 1;
        } else {
            other += 1;
        }
    }

    plain.div_ceil(4) + punct.div_ceil(2) + (other * 2).div_ceil(3)
}
