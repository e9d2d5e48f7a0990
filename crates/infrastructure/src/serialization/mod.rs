//! Deterministic JSON serialization for the persisted session record.
//!
//! Ensures clean diffs across rewrites by:
//! - Using 2-space indentation
//! - Adding trailing newline
//! - UTF-8 encoding without BOM

mod json;

pub use json::*;
