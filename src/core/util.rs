//! Common utilities

use std::thread;

/// Fallback worker count when available parallelism cannot be queried
const FALLBACK_WORKERS: usize = 4;

/// Take the first `max_chars` characters of `s`, returning (prefix, was_truncated).
///
/// Counts chars, not bytes, and does not look for word boundaries.
pub fn truncate_chars(s: &str, max_chars: usize) -> (&str, bool) {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => (&s[..end], true),
        None => (s, false),
    }
}

/// Resolve a requested worker count; 0 means "use available parallelism"
pub fn resolve_workers(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(FALLBACK_WORKERS)
}
