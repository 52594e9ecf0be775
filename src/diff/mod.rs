//! Structured model of `git diff --unified=0` output for a single file.

pub mod chunk;
pub mod file;
pub mod parse;

pub use chunk::{Chunk, Snippet};
pub use file::{FileDiff, sort_by_filename};
pub use parse::{ParseError, parse_file_diff};
