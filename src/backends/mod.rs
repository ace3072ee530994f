//! Backends module - Dataset access
//!
//! Provides:
//! - corpus: Concurrent bounded scan of a JSONL dataset
//! - doctor: Environment checking

pub mod corpus;
pub mod doctor;
