//! Flows module - Higher-level workflows built on search results
//!
//! Provides:
//! - summary: Plain-text digest of a match set for LLM context

pub mod summary;
