use std::sync::LazyLock;

use committer_core::Hunk;
use regex::Regex;

static COPYRIGHT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+;;; Copyright ©[^[:alpha:]]+(.*)$").expect("valid copyright regex")
});

/// The holder named by an added copyright line, if `line` is one.
///
/// # Examples
///
/// ```
/// use committer_changelog::copyright::copyright_holder;
///
/// let line = "+;;; Copyright © 2021, 2023 Jane Doe <jane@example.org>";
/// assert_eq!(copyright_holder(line).as_deref(), Some("Jane Doe <jane@example.org>"));
/// assert_eq!(copyright_holder(" ;;; Copyright © 2021 Jane Doe"), None);
/// ```
pub fn copyright_holder(line: &str) -> Option<String> {
    COPYRIGHT_LINE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Holders of every copyright line added in `lines`.
pub fn added_copyright_holders<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    lines.into_iter().filter_map(copyright_holder).collect()
}

/// Whether `hunk` is a copyright update to be folded into the previous
/// commit: it adds a copyright line to an existing file and every other
/// line it adds or removes is a comment or blank.
///
/// # Examples
///
/// ```
/// use committer_changelog::copyright::is_copyright_update;
/// use committer_core::Hunk;
/// use std::path::PathBuf;
///
/// let hunk = Hunk {
///     file_path: PathBuf::from("nongnu/packages/foo.scm"),
///     new_file_mode: None,
///     old_start: 2,
///     new_start: 2,
///     header: "@@ -2 +2,2 @@".into(),
///     lines: vec![
///         " ;;; Copyright © 2020 Jane Doe".into(),
///         "+;;; Copyright © 2024 Sam Roe".into(),
///     ],
///     introduces_definition: false,
/// };
/// assert!(is_copyright_update(&hunk));
/// ```
pub fn is_copyright_update(hunk: &Hunk) -> bool {
    !hunk.is_new_file()
        && hunk.added_lines().any(|line| copyright_holder(line).is_some())
        && hunk
            .lines
            .iter()
            .filter_map(|line| line.strip_prefix('+').or_else(|| line.strip_prefix('-')))
            .all(is_comment_or_blank)
}

fn is_comment_or_blank(text: &str) -> bool {
    let text = text.trim_start();
    text.is_empty() || text.starts_with(';')
}
