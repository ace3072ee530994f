//! Corpus scan backend
//!
//! Streams a line-delimited JSON dataset through a bounded worker pool and
//! collects at most `max_results` matching papers.
//!
//! The calling thread reads lines in file order and hands them to workers in
//! batches over a bounded channel. Workers parse and test each line on their
//! own; the only shared mutable state is the [`Accumulator`], whose cap check
//! and push happen under one lock. Once the cap is reached the reader stops
//! and workers drain what is left without evaluating it.
//!
//! Discovery order is a race between workers. With a single worker it equals
//! file order.
//!
//! The reader only blocks in `send` while some worker still holds the
//! receiver. A worker that panics releases its share of the receiver on
//! unwind; the last one out drops it, so `send` fails and the panic resurfaces
//! when the scope joins.

use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use tracing::{debug, info, warn};

use crate::core::error::SearchError;
use crate::core::model::{text_field, MatchSet, Paper, Query};
use crate::core::render::{RenderConfig, Renderer};
use crate::core::util::resolve_workers;

/// Legacy default cap
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Lines handed to a worker at a time
const BATCH_LINES: usize = 256;

/// Options for a corpus search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum number of papers to return (must be at least 1)
    pub max_results: usize,
    /// Worker pool size (0 = available parallelism)
    pub workers: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            workers: 0,
        }
    }
}

/// Counters from a completed scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Lines pulled from the file before the scan stopped
    pub lines_read: u64,
    /// Papers in the returned match set
    pub matched: usize,
    /// Lines dropped because they were not a JSON object
    pub skipped_lines: u64,
    /// Worker threads used
    pub workers: usize,
}

/// Searches one dataset file.
///
/// The searcher holds no state between calls and may be shared across
/// threads; each call opens its own read-only handle.
#[derive(Debug, Clone)]
pub struct CorpusSearcher {
    source: PathBuf,
    workers: usize,
}

impl CorpusSearcher {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            workers: 0,
        }
    }

    /// Set the worker pool size (0 = available parallelism)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Return up to `max_results` papers whose title or abstract contains `query`
    pub fn search(&self, query: &str, max_results: usize) -> Result<MatchSet, SearchError> {
        self.search_with_stats(query, max_results)
            .map(|(matches, _)| matches)
    }

    /// Like [`search`](Self::search), also reporting scan counters
    pub fn search_with_stats(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<(MatchSet, ScanStats), SearchError> {
        // Both checks happen before the filesystem is touched
        let query = Query::parse(query)?;
        if max_results == 0 {
            return Err(SearchError::InvalidLimit);
        }

        let file = open_corpus(&self.source)?;
        let workers = resolve_workers(self.workers);
        debug!(
            query = %query,
            path = %self.source.display(),
            max_results,
            workers,
            "starting corpus scan"
        );

        let (papers, stats) = scan(BufReader::new(file), &query, max_results, workers).map_err(
            |fault| SearchError::ScanFailure {
                path: self.source.clone(),
                line: fault.line,
                source: fault.source,
            },
        )?;

        info!(
            path = %self.source.display(),
            lines_read = stats.lines_read,
            matched = stats.matched,
            skipped_lines = stats.skipped_lines,
            "corpus scan finished"
        );
        Ok((MatchSet::from(papers), stats))
    }
}

/// Search `source` for `query`, returning at most `max_results` papers
pub fn search(query: &str, source: &Path, max_results: usize) -> Result<MatchSet, SearchError> {
    CorpusSearcher::new(source).search(query, max_results)
}

/// Run the search command
pub fn run_search(
    dataset: &Path,
    query: &str,
    options: &SearchOptions,
    config: RenderConfig,
) -> anyhow::Result<()> {
    let searcher = CorpusSearcher::new(dataset).with_workers(options.workers);
    let matches = searcher.search(query, options.max_results)?;

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render("Papers", matches.papers()));

    Ok(())
}

pub(crate) fn open_corpus(path: &Path) -> Result<File, SearchError> {
    let unavailable = |source: io::Error| SearchError::CorpusUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unavailable)?;
    let metadata = file.metadata().map_err(unavailable)?;
    if metadata.is_dir() {
        return Err(unavailable(io::Error::new(
            io::ErrorKind::Other,
            "path is a directory",
        )));
    }
    Ok(file)
}

/// Cap-bounded result buffer shared by the workers
struct Accumulator {
    cap: usize,
    papers: Mutex<Vec<Paper>>,
    full: AtomicBool,
}

impl Accumulator {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            papers: Mutex::new(Vec::with_capacity(cap.min(64))),
            full: AtomicBool::new(false),
        }
    }

    fn is_full(&self) -> bool {
        self.full.load(Ordering::Acquire)
    }

    /// Append unless the cap is already reached; late offers are dropped
    fn offer(&self, paper: Paper) {
        let mut papers = self.papers.lock().unwrap_or_else(PoisonError::into_inner);
        if papers.len() >= self.cap {
            return;
        }
        papers.push(paper);
        if papers.len() == self.cap {
            self.full.store(true, Ordering::Release);
        }
    }

    fn into_papers(self) -> Vec<Paper> {
        self.papers
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

struct Line {
    number: u64,
    bytes: Vec<u8>,
}

type Batch = Vec<Line>;

/// I/O fault while reading `line`
#[derive(Debug)]
struct ReadFault {
    line: u64,
    source: io::Error,
}

enum Outcome {
    Blank,
    Skipped,
    Miss,
    Hit(Paper),
}

fn scan<R: BufRead>(
    mut reader: R,
    query: &Query,
    cap: usize,
    workers: usize,
) -> Result<(Vec<Paper>, ScanStats), ReadFault> {
    let workers = workers.max(1);
    let accumulator = Accumulator::new(cap);
    let skipped = AtomicU64::new(0);
    let (sender, receiver) = sync_channel::<Batch>(workers * 2);
    let receiver = Arc::new(Mutex::new(receiver));

    let produced = thread::scope(|scope| {
        for _ in 0..workers {
            // Each worker owns a handle; the channel hangs up when the last one exits
            let receiver = Arc::clone(&receiver);
            scope.spawn(|| run_worker(receiver, query, &accumulator, &skipped));
        }
        drop(receiver);
        // Dropping the sender at the end of `produce` lets workers exit
        produce(&mut reader, sender, &accumulator)
    });
    let lines_read = produced?;

    let papers = accumulator.into_papers();
    let stats = ScanStats {
        lines_read,
        matched: papers.len(),
        skipped_lines: skipped.into_inner(),
        workers,
    };
    Ok((papers, stats))
}

/// Read lines in file order and feed them to the pool until EOF or the cap
fn produce<R: BufRead>(
    reader: &mut R,
    sender: SyncSender<Batch>,
    accumulator: &Accumulator,
) -> Result<u64, ReadFault> {
    let mut line_no = 0u64;
    let mut batch: Batch = Vec::with_capacity(BATCH_LINES);

    loop {
        if accumulator.is_full() {
            debug!(line = line_no, "result cap reached, stopping read");
            return Ok(line_no);
        }

        let mut bytes = Vec::new();
        let read = reader
            .read_until(b'\n', &mut bytes)
            .map_err(|source| ReadFault {
                line: line_no + 1,
                source,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;
        batch.push(Line {
            number: line_no,
            bytes,
        });

        if batch.len() == BATCH_LINES {
            let full = mem::replace(&mut batch, Vec::with_capacity(BATCH_LINES));
            if sender.send(full).is_err() {
                break;
            }
        }
    }

    if !batch.is_empty() {
        // Workers only hang up once the sender is gone, so this cannot fail
        let _ = sender.send(batch);
    }
    Ok(line_no)
}

fn run_worker(
    receiver: Arc<Mutex<Receiver<Batch>>>,
    query: &Query,
    accumulator: &Accumulator,
    skipped: &AtomicU64,
) {
    loop {
        let next = receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();
        let Ok(batch) = next else {
            return;
        };

        // Keep draining after the cap so the reader never blocks on a full channel
        for line in batch {
            if accumulator.is_full() {
                break;
            }
            match evaluate(&line, query) {
                Outcome::Hit(paper) => accumulator.offer(paper),
                Outcome::Skipped => {
                    skipped.fetch_add(1, Ordering::Relaxed);
                }
                Outcome::Blank | Outcome::Miss => {}
            }
        }
    }
}

fn evaluate(line: &Line, query: &Query) -> Outcome {
    let bytes = line.bytes.trim_ascii();
    if bytes.is_empty() {
        return Outcome::Blank;
    }

    let record: Map<String, Value> = match serde_json::from_slice(bytes) {
        Ok(record) => record,
        Err(e) => {
            warn!(line = line.number, error = %e, "skipping malformed corpus line");
            return Outcome::Skipped;
        }
    };

    let hit = query.matches(&text_field(&record, "title"))
        || query.matches(&text_field(&record, "abstract"));
    if !hit {
        return Outcome::Miss;
    }

    match Paper::from_record(record) {
        Ok(paper) => Outcome::Hit(paper),
        Err(e) => {
            warn!(line = line.number, error = %e, "skipping unprojectable corpus record");
            Outcome::Skipped
        }
    }
}
