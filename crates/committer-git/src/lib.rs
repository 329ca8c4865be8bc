//! Git access for committer.
//!
//! The pipeline talks to git only through the [`Vcs`] trait. [`GitCli`]
//! implements it by running the `git` executable against a work tree found
//! with `git2`.

pub mod vcs;

pub use vcs::{GitCli, Vcs};
