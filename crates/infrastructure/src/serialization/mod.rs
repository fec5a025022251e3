//! Deterministic JSON for files written to disk.
//!
//! Stored files use 2-space indentation and a trailing newline so they read
//! well and diff cleanly.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
