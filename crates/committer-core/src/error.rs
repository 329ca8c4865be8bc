use std::path::PathBuf;

use crate::types::Revision;

/// Errors that can occur while turning a diff into commits.
///
/// Library crates return this type directly; the binary renders it through
/// `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use committer_core::CommitterError;
///
/// let err = CommitterError::Config("wrap_width must be positive".into());
/// assert!(err.to_string().contains("wrap_width"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CommitterError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Repository discovery or inspection failure.
    #[error("git error: {0}")]
    #[diagnostic(help("run committer from inside a non-bare git checkout"))]
    Git(String),

    /// A git subprocess exited unsuccessfully.
    #[error("`{command}` failed: {detail}")]
    #[diagnostic(help(
        "the index was left as-is; inspect it with `git diff --cached` before re-running"
    ))]
    GitCommand {
        /// The command line that failed.
        command: String,
        /// Exit status and captured stderr.
        detail: String,
    },

    /// Malformed diff output.
    #[error("parse error: {0}")]
    Parse(String),

    /// A top-level form could not be read.
    #[error("cannot read S-expression in {} ({revision}) at line {line}: {message}", .file.display())]
    Syntax {
        /// File being read.
        file: PathBuf,
        /// Revision the text came from.
        revision: Revision,
        /// Line where reading failed.
        line: usize,
        /// Reader diagnostic.
        message: String,
    },

    /// A change sits outside any top-level definition.
    #[error("no top-level definition encloses line {line} of {} ({revision})", .file.display())]
    #[diagnostic(help("commit changes outside definitions by hand, then re-run committer"))]
    NoEnclosingDefinition {
        /// File containing the change.
        file: PathBuf,
        /// Line that was looked up.
        line: u32,
        /// Revision that was searched.
        revision: Revision,
    },

    /// The enclosing form does not name what it defines.
    #[error("the form at line {line} of {} does not name a definition", .file.display())]
    UnnamedDefinition {
        /// File containing the form.
        file: PathBuf,
        /// First line of the form.
        line: usize,
    },

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
