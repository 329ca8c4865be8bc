use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CommitterError;

/// Top-level configuration loaded from `.committer.toml`.
///
/// Every section is optional; omitted keys fall back to the defaults used
/// for the `nongnu` channel.
///
/// # Examples
///
/// ```
/// use committer_core::CommitterConfig;
///
/// let config = CommitterConfig::default();
/// assert_eq!(config.channel.name, "nongnu");
/// assert_eq!(config.message.wrap_width, 70);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitterConfig {
    /// Which channel is being committed to and which files belong to it.
    #[serde(default)]
    pub channel: ChannelConfig,
    /// Commit-message synthesis settings.
    #[serde(default)]
    pub message: MessageConfig,
    /// Git invocation settings.
    #[serde(default)]
    pub git: GitConfig,
}

impl CommitterConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CommitterError::Io`] if the file cannot be read,
    /// [`CommitterError::Toml`] if the content is not valid TOML, or
    /// [`CommitterError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use committer_core::CommitterConfig;
    /// use std::path::Path;
    ///
    /// let config = CommitterConfig::from_file(Path::new(".committer.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, CommitterError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CommitterError::Toml`] if parsing fails, or
    /// [`CommitterError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use committer_core::CommitterConfig;
    ///
    /// let toml = r#"
    /// [channel]
    /// name = "guix-science"
    /// "#;
    /// let config = CommitterConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.channel.name, "guix-science");
    /// assert_eq!(config.channel.subtree, "nongnu");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CommitterError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CommitterError> {
        if self.message.wrap_width == 0 {
            return Err(CommitterError::Config(
                "message.wrap_width must be positive".into(),
            ));
        }
        if self.message.definition_prefix.is_empty() {
            return Err(CommitterError::Config(
                "message.definition_prefix must not be empty".into(),
            ));
        }
        if self.channel.name.trim().is_empty() {
            return Err(CommitterError::Config("channel.name must not be empty".into()));
        }
        Ok(())
    }
}

/// Channel identity and the files that belong to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Prefix of every commit summary (default: `"nongnu"`).
    #[serde(default = "default_channel_name")]
    pub name: String,
    /// Pathspec handed to `git diff` (default: `"nongnu"`).
    #[serde(default = "default_subtree")]
    pub subtree: String,
    /// Glob patterns a changed file must match (default: `["*.scm"]`).
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    /// Glob patterns of changed files to leave alone.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_channel_name() -> String {
    "nongnu".into()
}

fn default_subtree() -> String {
    "nongnu".into()
}

fn default_include() -> Vec<String> {
    vec!["*.scm".into()]
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
            subtree: default_subtree(),
            include: default_include(),
            exclude: Vec::new(),
        }
    }
}

/// Commit-message synthesis configuration.
///
/// # Examples
///
/// ```
/// use committer_core::MessageConfig;
///
/// let config = MessageConfig::default();
/// assert_eq!(config.definition_prefix, "(define");
/// assert_eq!(config.tracked_fields.len(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageConfig {
    /// Column at which ChangeLog lines are wrapped (default: 70).
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
    /// Text an added line must start with (after `+`) to open a definition.
    #[serde(default = "default_definition_prefix")]
    pub definition_prefix: String,
    /// Field holding the version string (default: `"version"`).
    #[serde(default = "default_version_field")]
    pub version_field: String,
    /// List-valued fields whose entries are compared between revisions.
    #[serde(default = "default_tracked_fields")]
    pub tracked_fields: Vec<String>,
}

fn default_wrap_width() -> usize {
    70
}

fn default_definition_prefix() -> String {
    "(define".into()
}

fn default_version_field() -> String {
    "version".into()
}

fn default_tracked_fields() -> Vec<String> {
    vec![
        "inputs".into(),
        "propagated-inputs".into(),
        "native-inputs".into(),
    ]
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            wrap_width: default_wrap_width(),
            definition_prefix: default_definition_prefix(),
            version_field: default_version_field(),
            tracked_fields: default_tracked_fields(),
        }
    }
}

/// Git invocation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Git executable (default: `"git"`).
    #[serde(default = "default_program")]
    pub program: String,
    /// Context lines requested from `git diff` (default: 1).
    #[serde(default = "default_context_lines")]
    pub context_lines: u32,
    /// Pause after every apply and commit, in milliseconds (default: 1).
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_program() -> String {
    "git".into()
}

fn default_context_lines() -> u32 {
    1
}

fn default_delay_ms() -> u64 {
    1
}

impl GitConfig {
    /// The pause inserted between git invocations.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            context_lines: default_context_lines(),
            delay_ms: default_delay_ms(),
        }
    }
}
