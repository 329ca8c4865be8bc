//! Commit-message synthesis.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use committer_core::{ChannelConfig, MessageConfig};
use committer_sexp::Definition;
use regex::Regex;
use serde::Serialize;

use crate::clause::field_change_clause;
use crate::wrap::wrap_words;

static LOCATION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:graph:]]+: ").expect("valid location prefix regex"));

/// A commit message: one-line summary plus ChangeLog body.
///
/// # Examples
///
/// ```
/// use committer_changelog::message::CommitMessage;
///
/// let msg = CommitMessage {
///     summary: "nongnu: Add foo.".into(),
///     body: "* nongnu/packages/foo.scm (foo): New variable.".into(),
/// };
/// assert_eq!(
///     msg.to_string(),
///     "nongnu: Add foo.\n\n* nongnu/packages/foo.scm (foo): New variable.\n"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitMessage {
    /// First line of the commit.
    pub summary: String,
    /// ChangeLog body, already wrapped.
    pub body: String,
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary)?;
        writeln!(f)?;
        writeln!(f, "{}", self.body)
    }
}

/// User-supplied message that replaces automatic derivation.
///
/// Built from the tool's positional arguments and handed to the pipeline.
///
/// # Examples
///
/// ```
/// use committer_changelog::message::MessageOverride;
///
/// let ov = MessageOverride::new("  Fix build.. ", None);
/// assert_eq!(ov.message, "Fix build");
/// assert_eq!(ov.changelog, "Fix build");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageOverride {
    /// Summary text, without trailing period.
    pub message: String,
    /// ChangeLog text, without trailing period.
    pub changelog: String,
}

impl MessageOverride {
    /// Normalize the message and optional changelog. The changelog falls
    /// back to the message.
    pub fn new(message: &str, changelog: Option<&str>) -> Self {
        let message = normalize(message);
        let changelog = changelog
            .map(normalize)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| message.clone());
        Self { message, changelog }
    }

    /// Build an override from zero, one, or two positional arguments.
    pub fn from_args(message: Option<&str>, changelog: Option<&str>) -> Option<Self> {
        message.map(|m| Self::new(m, changelog))
    }
}

fn normalize(text: &str) -> String {
    text.trim().trim_end_matches('.').trim_end().to_string()
}

/// Builds commit messages for one channel.
///
/// # Examples
///
/// ```
/// use committer_changelog::message::MessageBuilder;
/// use committer_core::{ChannelConfig, MessageConfig};
/// use std::path::Path;
///
/// let builder = MessageBuilder::new(&ChannelConfig::default(), &MessageConfig::default());
/// let msg = builder.addition(Path::new("nongnu/packages/game.scm"), "foo", Some("2.0"));
/// assert_eq!(msg.summary, "nongnu: foo: Update to 2.0.");
/// ```
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    channel: String,
    width: usize,
    tracked_fields: Vec<String>,
}

impl MessageBuilder {
    /// Create a builder from configuration.
    pub fn new(channel: &ChannelConfig, message: &MessageConfig) -> Self {
        Self {
            channel: channel.name.clone(),
            width: message.wrap_width,
            tracked_fields: message.tracked_fields.clone(),
        }
    }

    /// Message for a group that introduces the definition `name`.
    pub fn addition(&self, file: &Path, name: &str, version: Option<&str>) -> CommitMessage {
        let summary = match version {
            Some(version) => format!("{}: {name}: Update to {version}.", self.channel),
            None => format!("{}: Add {name}.", self.channel),
        };
        let body = self.wrap(&format!("* {} ({name}): New variable.", file.display()));
        CommitMessage { summary, body }
    }

    /// Message for a group that edits an existing definition.
    ///
    /// The body lists, for every tracked field whose entries changed, what
    /// was removed and what was added.
    pub fn modification(
        &self,
        file: &Path,
        name: &str,
        old: &Definition,
        new: &Definition,
    ) -> CommitMessage {
        let update = match new.version.as_deref() {
            Some(version) => format!("Update to {version}."),
            None => "Update.".to_string(),
        };
        let summary = format!("{}: {name}: {update}", self.channel);

        let mut body = vec![self.wrap(&format!("* {} ({name}): {update}", file.display()))];
        for field in &self.tracked_fields {
            let old_entries = old.field(field).entries();
            let new_entries = new.field(field).entries();
            if let Some(clause) = field_change_clause(&old_entries, &new_entries) {
                body.push(self.wrap(&format!("[{field}]: {clause}")));
            }
        }

        CommitMessage {
            summary,
            body: body.join("\n"),
        }
    }

    /// Message built from user-supplied text.
    ///
    /// The `: ` separator after the location is omitted when the changelog
    /// already starts with a location of its own, such as `[inputs]: `.
    pub fn custom(&self, file: &Path, name: &str, ov: &MessageOverride) -> CommitMessage {
        let summary = format!("{}: {name}: {}.", self.channel, ov.message);
        let separator = if LOCATION_PREFIX.is_match(&ov.changelog) {
            ""
        } else {
            ": "
        };
        let body = self.wrap(&format!(
            "* {} ({name}){separator}{}.",
            file.display(),
            ov.changelog
        ));
        CommitMessage { summary, body }
    }

    fn wrap(&self, line: &str) -> String {
        wrap_words(line, self.width)
    }
}
