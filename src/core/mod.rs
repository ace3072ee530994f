//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Record model (Paper, Query, MatchSet)
//! - Search error taxonomy
//! - Rendering functions for different output formats
//! - Token counting for LLM context budgeting
//! - Common utilities

pub mod error;
pub mod model;
pub mod render;
pub mod tokenizer;
pub mod util;
