//! JSON helpers for the files the client writes.
//!
//! Output is stable across runs:
//! - Keys sorted alphabetically (via `BTreeMap` in the stored types)
//! - 2-space indentation
//! - Trailing newline

mod json;

pub use json::{SerializationError, from_json, to_json_stable};
