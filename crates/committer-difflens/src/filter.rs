//! Narrow parsed hunks down to the definition files of a channel.
//!
//! Patches, auxiliary data, and anything else under the channel subtree
//! that is not a definition file is left for the user to commit by hand.

use std::path::Path;

use committer_core::{ChannelConfig, CommitterError, Hunk};
use tracing::debug;

/// Include/exclude glob filter over changed file paths.
///
/// # Examples
///
/// ```
/// use committer_core::ChannelConfig;
/// use committer_difflens::filter::PathFilter;
///
/// let filter = PathFilter::from_config(&ChannelConfig::default()).unwrap();
/// assert!(filter.accepts("nongnu/packages/linux.scm"));
/// assert!(!filter.accepts("nongnu/packages/patches/fix.patch"));
/// ```
pub struct PathFilter {
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
}

impl PathFilter {
    /// Build a filter from the channel configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CommitterError::Config`] if a pattern is not a valid glob.
    pub fn from_config(config: &ChannelConfig) -> Result<Self, CommitterError> {
        Ok(Self {
            include: compile(&config.include)?,
            exclude: compile(&config.exclude)?,
        })
    }

    /// Check whether a changed file should be committed by committer.
    ///
    /// An empty include list accepts everything not excluded.
    pub fn accepts(&self, path: &str) -> bool {
        let path = Path::new(path);
        let included =
            self.include.is_empty() || self.include.iter().any(|p| p.matches_path(path));
        included && !self.exclude.iter().any(|p| p.matches_path(path))
    }

    /// Keep only the hunks of accepted files, preserving order.
    ///
    /// # Examples
    ///
    /// ```
    /// use committer_core::ChannelConfig;
    /// use committer_difflens::{filter::PathFilter, parser::parse_hunks};
    ///
    /// let diff = "--- a/n/x.patch\n+++ b/n/x.patch\n@@ -1 +1 @@\n-a\n+b\n\
    ///             --- a/n/x.scm\n+++ b/n/x.scm\n@@ -1 +1 @@\n-a\n+b\n";
    /// let hunks = parse_hunks(diff, "(define").unwrap();
    /// let filter = PathFilter::from_config(&ChannelConfig::default()).unwrap();
    /// let kept = filter.retain(hunks);
    /// assert_eq!(kept.len(), 1);
    /// ```
    pub fn retain(&self, hunks: Vec<Hunk>) -> Vec<Hunk> {
        hunks
            .into_iter()
            .filter(|hunk| {
                let keep = self.accepts(&hunk.file_path.to_string_lossy());
                if !keep {
                    debug!(file = %hunk.file_path.display(), "ignoring hunk outside definition files");
                }
                keep
            })
            .collect()
    }
}

fn compile(patterns: &[String]) -> Result<Vec<glob::Pattern>, CommitterError> {
    patterns
        .iter()
        .map(|pat| {
            glob::Pattern::new(pat)
                .map_err(|e| CommitterError::Config(format!("invalid glob `{pat}`: {e}")))
        })
        .collect()
}
