//! Diff ingestion for committer.
//!
//! Parses the output of `git diff` into ordered hunks and narrows them down
//! to the files of the channel that hold package definitions.

pub mod filter;
pub mod parser;
