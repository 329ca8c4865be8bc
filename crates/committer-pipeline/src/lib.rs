//! Turns a working-tree diff of a channel into one commit per definition.
//!
//! [`Committer`] drives the whole run: it diffs the channel subtree, groups
//! hunks by the top-level definition they touch, synthesizes a ChangeLog
//! message for each group, and stages and commits the groups through a
//! [`committer_git::Vcs`].

pub mod committer;
pub mod group;
pub mod sources;

#[cfg(test)]
mod testing;

pub use committer::{Amendment, CommitRecord, Committer, RunReport};
pub use group::{group_hunks, HunkGroup};
