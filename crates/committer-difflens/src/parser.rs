use std::path::PathBuf;

use committer_core::{CommitterError, Hunk};
use tracing::warn;

/// Mode assumed for a created file whose diff carries no `new file mode` line.
const DEFAULT_FILE_MODE: &str = "100644";

/// Parse a unified diff (as produced by `git diff`) into a flat, ordered list
/// of [`Hunk`]s.
///
/// A hunk is flagged as introducing a definition when one of its added lines
/// starts with `definition_prefix` right after the `+` marker; module
/// declarations do not count. Hunks of deleted files and binary sections are
/// dropped. Paths quoted by `core.quotePath` are decoded.
///
/// # Errors
///
/// Returns [`CommitterError::Parse`] if a hunk header is malformed or a hunk
/// appears before any file header.
///
/// # Examples
///
/// ```
/// use committer_difflens::parser::parse_hunks;
///
/// let diff = "diff --git a/nongnu/packages/foo.scm b/nongnu/packages/foo.scm\n\
///             --- a/nongnu/packages/foo.scm\n\
///             +++ b/nongnu/packages/foo.scm\n\
///             @@ -9,2 +9,2 @@\n\
///             \x20  (name \"foo\")\n\
///             -  (version \"1.0\")\n\
///             +  (version \"1.1\")\n";
/// let hunks = parse_hunks(diff, "(define").unwrap();
/// assert_eq!(hunks.len(), 1);
/// assert_eq!(hunks[0].old_start, 9);
/// assert!(!hunks[0].introduces_definition);
/// ```
pub fn parse_hunks(input: &str, definition_prefix: &str) -> Result<Vec<Hunk>, CommitterError> {
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut file = FileState::default();
    let mut current: Option<PendingHunk> = None;

    for line in input.lines() {
        if let Some(pending) = current.as_mut() {
            if pending.expects_more() {
                pending.push(line, definition_prefix)?;
                continue;
            }
            if line.starts_with('\\') {
                pending.hunk.lines.push(line.to_string());
                continue;
            }
        }
        flush_hunk(&mut hunks, &file, &mut current);

        if line.starts_with("diff --git ") {
            file = FileState::default();
            continue;
        }

        if let Some(mode) = line.strip_prefix("new file mode ") {
            file.new_file_mode = Some(mode.trim().to_string());
            continue;
        }

        if line.starts_with("deleted file mode") {
            file.is_deleted_file = true;
            continue;
        }

        if line.starts_with("Binary files ") && line.ends_with(" differ") {
            file.is_binary = true;
            continue;
        }

        if let Some(path) = line.strip_prefix("--- ") {
            if parse_path(path).is_none() && file.new_file_mode.is_none() {
                file.new_file_mode = Some(DEFAULT_FILE_MODE.to_string());
            }
            continue;
        }

        if let Some(path) = line.strip_prefix("+++ ") {
            match parse_path(path) {
                Some(p) => file.path = Some(p),
                None => file.is_deleted_file = true,
            }
            continue;
        }

        if line.starts_with("@@ ") {
            let file_path = file
                .path
                .clone()
                .or_else(|| file.is_deleted_file.then(PathBuf::new))
                .ok_or_else(|| {
                    CommitterError::Parse(format!("hunk before any file header: {line}"))
                })?;
            let header = parse_hunk_header(line)?;
            current = Some(PendingHunk {
                hunk: Hunk {
                    file_path,
                    new_file_mode: file.new_file_mode.clone(),
                    old_start: header.old_start,
                    new_start: header.new_start,
                    header: line.to_string(),
                    lines: Vec::new(),
                    introduces_definition: false,
                },
                old_remaining: header.old_lines,
                new_remaining: header.new_lines,
            });
        }
    }

    flush_hunk(&mut hunks, &file, &mut current);
    Ok(hunks)
}

#[derive(Default)]
struct FileState {
    path: Option<PathBuf>,
    new_file_mode: Option<String>,
    is_deleted_file: bool,
    is_binary: bool,
}

struct PendingHunk {
    hunk: Hunk,
    old_remaining: u32,
    new_remaining: u32,
}

impl PendingHunk {
    fn expects_more(&self) -> bool {
        self.old_remaining > 0 || self.new_remaining > 0
    }

    fn push(&mut self, line: &str, definition_prefix: &str) -> Result<(), CommitterError> {
        if let Some(rest) = line.strip_prefix('+') {
            self.new_remaining = self.new_remaining.saturating_sub(1);
            if Hunk::starts_definition(rest, definition_prefix) {
                self.hunk.introduces_definition = true;
            }
        } else if line.starts_with('-') {
            self.old_remaining = self.old_remaining.saturating_sub(1);
        } else if line.starts_with(' ') || line.is_empty() {
            self.old_remaining = self.old_remaining.saturating_sub(1);
            self.new_remaining = self.new_remaining.saturating_sub(1);
        } else if !line.starts_with('\\') {
            return Err(CommitterError::Parse(format!(
                "unexpected line inside hunk {}: {line}",
                self.hunk.header
            )));
        }

        // Blank context lines lose their marker when diffs travel by mail.
        let stored = if line.is_empty() { " " } else { line };
        self.hunk.lines.push(stored.to_string());
        Ok(())
    }
}

fn flush_hunk(hunks: &mut Vec<Hunk>, file: &FileState, pending: &mut Option<PendingHunk>) {
    let Some(p) = pending.take() else {
        return;
    };
    if file.is_binary {
        return;
    }
    if file.is_deleted_file {
        warn!(header = %p.hunk.header, "skipping hunk of a deleted file");
        return;
    }
    hunks.push(p.hunk);
}

/// Strip quoting and the `a/`/`b/` prefixes. Returns `None` for `/dev/null`.
fn parse_path(raw: &str) -> Option<PathBuf> {
    // git appends a tab and timestamp in some modes.
    let raw = raw.split('\t').next().unwrap_or(raw);
    let unquoted = unquote_c_style(raw);
    let normalized = unquoted.as_str();

    if normalized == "/dev/null" {
        return None;
    }

    let stripped = normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
        .unwrap_or(normalized);

    Some(PathBuf::from(stripped))
}

/// Decode a path git quoted C-style: surrounding double quotes, backslash
/// escapes, and non-ASCII bytes as three-digit octal. Unquoted input is
/// returned as is.
fn unquote_c_style(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut rest = inner.as_bytes();
    while let Some((&b, tail)) = rest.split_first() {
        rest = tail;
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        let Some((&esc, tail)) = rest.split_first() else {
            bytes.push(b'\\');
            break;
        };
        rest = tail;
        let decoded = match esc {
            b'a' => 0x07,
            b'b' => 0x08,
            b't' => b'\t',
            b'n' => b'\n',
            b'v' => 0x0b,
            b'f' => 0x0c,
            b'r' => b'\r',
            b'0'..=b'3' if rest.len() >= 2 && rest[..2].iter().all(|d| (b'0'..=b'7').contains(d)) => {
                let value = (esc - b'0') * 64 + (rest[0] - b'0') * 8 + (rest[1] - b'0');
                rest = &rest[2..];
                value
            }
            other => other,
        };
        bytes.push(decoded);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

struct HunkHeader {
    old_start: u32,
    old_lines: u32,
    new_start: u32,
    new_lines: u32,
}

fn parse_hunk_header(line: &str) -> Result<HunkHeader, CommitterError> {
    let inner = line
        .strip_prefix("@@ ")
        .and_then(|s| {
            let end = s.find(" @@")?;
            Some(&s[..end])
        })
        .ok_or_else(|| CommitterError::Parse(format!("invalid hunk header: {line}")))?;

    let parts: Vec<&str> = inner.split(' ').collect();
    if parts.len() != 2 || !parts[0].starts_with('-') || !parts[1].starts_with('+') {
        return Err(CommitterError::Parse(format!("invalid hunk header: {line}")));
    }

    let (old_start, old_lines) = parse_range(parts[0], line)?;
    let (new_start, new_lines) = parse_range(parts[1], line)?;

    Ok(HunkHeader {
        old_start,
        old_lines,
        new_start,
        new_lines,
    })
}

/// Parse `-12,3` / `+5` into `(start, count)`. The start is the absolute value
/// of the signed first number; the count defaults to 1.
fn parse_range(range: &str, context: &str) -> Result<(u32, u32), CommitterError> {
    let (start, count) = match range.split_once(',') {
        Some((start, count)) => (start, Some(count)),
        None => (range, None),
    };
    let s: i64 = start
        .parse()
        .map_err(|_| CommitterError::Parse(format!("invalid range number in: {context}")))?;
    let s = u32::try_from(s.unsigned_abs())
        .map_err(|_| CommitterError::Parse(format!("range number too large in: {context}")))?;
    let c = match count {
        Some(c) => c
            .parse()
            .map_err(|_| CommitterError::Parse(format!("invalid range count in: {context}")))?,
        None => 1,
    };
    Ok((s, c))
}
