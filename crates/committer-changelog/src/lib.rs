//! ChangeLog-style commit messages for package definition changes.
//!
//! Renders field differences as prose clauses, wraps ChangeLog lines, and
//! recognises added copyright lines.

pub mod clause;
pub mod copyright;
pub mod message;
pub mod wrap;

pub use message::{CommitMessage, MessageBuilder, MessageOverride};
