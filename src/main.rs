//! paperscan - Search a JSONL paper corpus and build LLM-ready digests
//!
//! paperscan provides:
//! - Case-insensitive substring search over titles and abstracts
//! - A bounded worker pool with a hard result cap
//! - Plain-text digests and context prompts for chat models
//! - Unified output format (jsonl/json/md)

use anyhow::Result;
use clap::Parser;

use paperscan::cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
