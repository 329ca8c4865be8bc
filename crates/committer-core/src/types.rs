use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Module declarations are never package definitions, even though they share
/// the definition prefix.
const MODULE_DECLARATION: &str = "(define-module";

/// A single hunk from a unified diff of the channel subtree.
///
/// Lines keep their diff marker (`' '`, `'+'`, `'-'` or `'\\'`) so the hunk
/// can be re-emitted verbatim as a patch for the index.
///
/// # Examples
///
/// ```
/// use committer_core::Hunk;
/// use std::path::PathBuf;
///
/// let hunk = Hunk {
///     file_path: PathBuf::from("nongnu/packages/foo.scm"),
///     new_file_mode: None,
///     old_start: 10,
///     new_start: 10,
///     header: "@@ -10,2 +10,2 @@".into(),
///     lines: vec![" (define-public foo".into(), "-  1)".into(), "+  2)".into()],
///     introduces_definition: false,
/// };
/// assert_eq!(hunk.leading_context(), 1);
/// assert_eq!(hunk.old_lookup_line(), 11);
/// assert_eq!(hunk.new_lookup_line(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hunk {
    /// Path of the affected file, relative to the repository root.
    pub file_path: PathBuf,
    /// Mode of a file the diff creates (old side `/dev/null`), e.g. `100644`.
    pub new_file_mode: Option<String>,
    /// Starting line in the old revision.
    pub old_start: u32,
    /// Starting line in the new revision.
    pub new_start: u32,
    /// The raw `@@ ... @@` header line.
    pub header: String,
    /// Raw diff lines, each still carrying its marker.
    pub lines: Vec<String>,
    /// Whether an added line starts a new top-level definition.
    pub introduces_definition: bool,
}

fn is_change(line: &str) -> bool {
    line.starts_with('+') || line.starts_with('-')
}

impl Hunk {
    /// Whether `text`, a line without its diff marker, opens a definition.
    ///
    /// ```
    /// use committer_core::Hunk;
    ///
    /// assert!(Hunk::starts_definition("(define-public foo", "(define"));
    /// assert!(!Hunk::starts_definition("(define-module (nongnu packages foo))", "(define"));
    /// ```
    pub fn starts_definition(text: &str, prefix: &str) -> bool {
        text.starts_with(prefix) && !text.starts_with(MODULE_DECLARATION)
    }

    /// Whether the diff creates this file.
    pub fn is_new_file(&self) -> bool {
        self.new_file_mode.is_some()
    }

    /// Number of unchanged lines before the first added or removed line.
    pub fn leading_context(&self) -> u32 {
        self.lines.iter().take_while(|l| !is_change(l)).count() as u32
    }

    /// Lines present on one side of the hunk, numbered in that revision.
    fn side(&self, start: u32, marker: char) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.lines
            .iter()
            .filter(move |l| l.starts_with(' ') || l.starts_with(marker))
            .zip(start..)
            .map(|(l, n)| (n, l.as_str()))
    }

    /// First changed line on one side, or the line just before the change
    /// point when that side only has context.
    fn lookup_line(&self, start: u32, marker: char) -> u32 {
        if let Some((line, _)) = self.side(start, marker).find(|(_, l)| l.starts_with(marker)) {
            return line;
        }
        if self.side(start, marker).next().is_none() {
            // `-N,0` and `+N,0` already name the line before the change.
            return start;
        }
        (start + self.leading_context()).saturating_sub(1)
    }

    /// Line of the old revision where this hunk's change sits: the first
    /// removed line, or the line before a pure insertion.
    pub fn old_lookup_line(&self) -> u32 {
        self.lookup_line(self.old_start, '-')
    }

    /// Line of the new revision where this hunk's change sits: the first
    /// added line, or the line before a pure deletion.
    pub fn new_lookup_line(&self) -> u32 {
        self.lookup_line(self.new_start, '+')
    }

    /// Added lines, marker included.
    pub fn added_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.starts_with('+'))
            .map(String::as_str)
    }

    /// The first added line opening a definition, with its line number in
    /// the new revision.
    ///
    /// # Examples
    ///
    /// ```
    /// use committer_core::Hunk;
    /// use std::path::PathBuf;
    ///
    /// let hunk = Hunk {
    ///     file_path: PathBuf::from("f.scm"),
    ///     new_file_mode: None,
    ///     old_start: 4,
    ///     new_start: 4,
    ///     header: "@@ -4 +4,3 @@".into(),
    ///     lines: vec![" ".into(), "+".into(), "+(define-public bar".into()],
    ///     introduces_definition: true,
    /// };
    /// assert_eq!(hunk.first_added_definition("(define"), Some((6, "+(define-public bar")));
    /// ```
    pub fn first_added_definition(&self, prefix: &str) -> Option<(u32, &str)> {
        self.side(self.new_start, '+').find(|(_, l)| {
            l.strip_prefix('+')
                .is_some_and(|rest| Self::starts_definition(rest, prefix))
        })
    }

    /// Name introduced by the first added definition line: its second
    /// whitespace-separated token.
    pub fn defined_name(&self, prefix: &str) -> Option<&str> {
        let (_, line) = self.first_added_definition(prefix)?;
        line.split_whitespace().nth(1)
    }

    /// Render this hunk as a standalone git patch.
    ///
    /// # Examples
    ///
    /// ```
    /// use committer_core::Hunk;
    /// use std::path::PathBuf;
    ///
    /// let hunk = Hunk {
    ///     file_path: PathBuf::from("a.scm"),
    ///     new_file_mode: None,
    ///     old_start: 1,
    ///     new_start: 1,
    ///     header: "@@ -1 +1 @@".into(),
    ///     lines: vec!["-old".into(), "+new".into()],
    ///     introduces_definition: false,
    /// };
    /// assert!(hunk.to_patch().starts_with("diff --git a/a.scm b/a.scm\n"));
    /// assert!(hunk.to_patch().ends_with("-old\n+new\n"));
    /// ```
    pub fn to_patch(&self) -> String {
        let path = self.file_path.display();
        let mut patch = format!("diff --git a/{path} b/{path}\n");
        match &self.new_file_mode {
            Some(mode) => patch.push_str(&format!("new file mode {mode}\n--- /dev/null\n")),
            None => patch.push_str(&format!("--- a/{path}\n")),
        }
        patch.push_str(&format!("+++ b/{path}\n{}\n", self.header));
        for line in &self.lines {
            patch.push_str(line);
            patch.push('\n');
        }
        patch
    }
}

/// Classification of a group of hunks.
///
/// # Examples
///
/// ```
/// use committer_core::ChangeKind;
///
/// assert_eq!(ChangeKind::Addition.to_string(), "addition");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The group introduces a new top-level definition.
    Addition,
    /// The group edits an existing definition.
    Modification,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Addition => write!(f, "addition"),
            ChangeKind::Modification => write!(f, "modification"),
        }
    }
}

/// Which version of a file a definition was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Revision {
    /// The last commit.
    Head,
    /// The file as it currently is on disk.
    WorkTree,
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Head => write!(f, "HEAD"),
            Revision::WorkTree => write!(f, "working tree"),
        }
    }
}

/// Output format for the run report and dry-run plan.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use committer_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Commit messages as they are written to git.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
