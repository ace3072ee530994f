//! CLI module - Command-line interface definitions and handlers

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::backends::corpus::{SearchOptions, DEFAULT_MAX_RESULTS};
use crate::core::error::SearchError;
use crate::core::render::{OutputFormat, RenderConfig};
use crate::core::tokenizer::TokenModel;

/// Dataset used when neither --dataset nor PAPERSCAN_DATASET is given
pub const DEFAULT_DATASET: &str = "arxiv-metadata-oai-snapshot.json";

/// paperscan - substring search over a JSONL paper corpus, with LLM-ready digests.
#[derive(Parser, Debug)]
#[command(name = "paperscan")]
#[command(
    author,
    version,
    about,
    long_about = r#"paperscan scans a line-delimited JSON corpus of paper records (one JSON
object per line, e.g. the arXiv metadata snapshot) for a case-insensitive
substring in the title or abstract.

The scan runs on a worker pool and stops as soon as --max-results papers
have been found, so the returned papers are the first ones discovered, not
the first ones in the file. Use --workers 1 for file order.

Examples:
    paperscan --dataset arxiv.jsonl search "graph neural"
    paperscan search "diffusion" --max-results 10 --format md
    paperscan digest "reinforcement learning" --prompt --stats
    paperscan doctor
"#
)]
pub struct Cli {
    /// Path to the line-delimited JSON dataset.
    #[arg(
        long,
        global = true,
        env = "PAPERSCAN_DATASET",
        default_value = DEFAULT_DATASET,
        value_name = "PATH",
        long_help = "Path to the line-delimited JSON dataset.\n\n\
Resolved once at startup from this flag, then the PAPERSCAN_DATASET environment\n\
variable, then the default file name in the current directory."
    )]
    pub dataset: PathBuf,

    /// Output format for match sets (jsonl/json/md).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format for search and doctor results.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- md (markdown)\n\n\
The digest command always prints plain text."
    )]
    pub format: String,

    /// Worker threads for the scan (0 = available parallelism).
    #[arg(long, global = true, default_value_t = 0, value_name = "N")]
    pub workers: usize,

    /// Disable colored log output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (errors only on stderr).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (scan diagnostics on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Log scan progress at debug level on stderr. RUST_LOG, when set,\n\
takes precedence over this flag and --quiet."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find papers whose title or abstract contains QUERY.
    #[command(
        long_about = "Scan the dataset for QUERY (trimmed, case-insensitive substring) in each\n\
record's title or abstract and print up to --max-results matching papers,\n\
projected to title, abstract, authors, categories, doi and update_date.\n\n\
Malformed lines are skipped with a warning on stderr.\n\n\
Examples:\n\
  paperscan search transformer\n\
  paperscan search \"protein folding\" -n 20 --format md\n"
    )]
    Search {
        /// Text to look for.
        #[arg(value_name = "QUERY")]
        query: String,

        /// Maximum number of papers to return.
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS, value_name = "N")]
        max_results: usize,
    },

    /// Search, then print a plain-text digest of the matches.
    #[command(
        long_about = "Run a search and print one paragraph per match: its index, title, and\n\
the first 300 characters of its abstract. Prints \"No relevant papers found.\"\n\
when nothing matches.\n\n\
With --prompt the digest is wrapped as model context followed by the query\n\
as the question.\n\n\
Examples:\n\
  paperscan digest \"graph neural\"\n\
  paperscan digest \"few-shot\" --prompt --stats --token-model o200k\n"
    )]
    Digest {
        /// Text to look for.
        #[arg(value_name = "QUERY")]
        query: String,

        /// Maximum number of papers to include.
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS, value_name = "N")]
        max_results: usize,

        /// Wrap the digest as "Context: ... Question: QUERY".
        #[arg(long)]
        prompt: bool,

        /// Print digest size (papers, chars, tokens) to stderr.
        #[arg(long)]
        stats: bool,

        /// Token model for --stats (cl100k, o200k, heuristic).
        #[arg(long, default_value = "cl100k", value_name = "MODEL")]
        token_model: String,
    },

    /// Check that the dataset and tokenizer encodings are usable.
    Doctor,
}

/// Install the stderr log subscriber
fn init_logging(verbose: bool, quiet: bool, no_color: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!no_color)
                .with_target(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .try_init();
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.quiet, cli.no_color);

    let format: OutputFormat = cli.format.parse().map_err(anyhow::Error::msg)?;
    let render_config = RenderConfig::with_pretty(format, cli.pretty);
    let dataset = cli.dataset;

    let outcome = match cli.command {
        Commands::Search { query, max_results } => {
            let options = SearchOptions {
                max_results,
                workers: cli.workers,
            };
            crate::backends::corpus::run_search(&dataset, &query, &options, render_config)
        }

        Commands::Digest {
            query,
            max_results,
            prompt,
            stats,
            token_model,
        } => {
            let token_model: TokenModel = token_model.parse().map_err(anyhow::Error::msg)?;
            let options = SearchOptions {
                max_results,
                workers: cli.workers,
            };
            crate::flows::summary::run_digest(
                &dataset,
                &query,
                &options,
                prompt,
                stats.then_some(token_model),
            )
        }

        Commands::Doctor => crate::backends::doctor::run_doctor(&dataset, render_config),
    };
    outcome.map_err(tag_search_error)
}

/// Prefix search failures with their stable code, e.g. `[INVALID_QUERY] invalid query: ...`
fn tag_search_error(err: anyhow::Error) -> anyhow::Error {
    match err.downcast::<SearchError>() {
        Ok(search) => {
            let code = search.code();
            let message = search.to_string();
            anyhow::Error::new(search).context(format!("[{}] {}", code, message))
        }
        Err(other) => other,
    }
}
