//! Core types, configuration, and error handling for committer.
//!
//! This crate provides the shared foundation used by all other committer crates:
//! - [`CommitterError`]: unified error type using `thiserror` and `miette`
//! - [`CommitterConfig`]: configuration loaded from `.committer.toml`
//! - Shared types: [`Hunk`], [`ChangeKind`], [`Revision`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{ChannelConfig, CommitterConfig, GitConfig, MessageConfig};
pub use error::CommitterError;
pub use types::{ChangeKind, Hunk, OutputFormat, Revision};

/// A convenience `Result` type for committer operations.
pub type Result<T> = std::result::Result<T, CommitterError>;
