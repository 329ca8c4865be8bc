//! Locate the top-level form surrounding a line.

use serde::Serialize;

use crate::reader::{ReadError, Reader, Sexp};

/// A top-level form together with the lines it spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelForm {
    /// 1-based line of the opening parenthesis.
    pub start_line: usize,
    /// 1-based line of the closing parenthesis.
    pub end_line: usize,
    /// The form itself.
    pub sexp: Sexp,
}

/// Return the last top-level form that starts at or before `target_line`.
///
/// Lines are scanned from the top of `source`. A line whose first column
/// opens a parenthesis starts a form; the whole form is read and scanning
/// resumes on the line after the one where it ends, so multi-line forms are
/// skipped as a unit. Any other line is skipped on its own. Returns `None`
/// when no form starts at or above the target.
///
/// # Errors
///
/// Returns a [`ReadError`] if a form met on the way cannot be read.
///
/// # Examples
///
/// ```
/// use committer_sexp::lookup::surrounding_form;
///
/// let src = "(define-module (m))\n\n(define-public foo\n  (package\n    (name \"foo\")))\n";
/// let form = surrounding_form(src, 5).unwrap().unwrap();
/// assert_eq!(form.start_line, 3);
/// assert_eq!(form.end_line, 5);
/// assert!(surrounding_form(src, 0).unwrap().is_none());
/// ```
pub fn surrounding_form(source: &str, target_line: usize) -> Result<Option<TopLevelForm>, ReadError> {
    let line_starts = line_offsets(source);
    let mut candidate = None;
    let mut line = 1;

    while line <= target_line && line <= line_starts.len() {
        let offset = line_starts[line - 1];
        if source[offset..].starts_with('(') {
            let mut reader = Reader::at(source, offset, line);
            let Some(sexp) = reader.read()? else {
                break;
            };
            let end_line = reader.line();
            candidate = Some(TopLevelForm {
                start_line: line,
                end_line,
                sexp,
            });
            line = end_line + 1;
        } else {
            line += 1;
        }
    }

    Ok(candidate)
}

fn line_offsets(source: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    offsets.extend(
        source
            .char_indices()
            .filter(|&(_, c)| c == '\n')
            .map(|(i, _)| i + 1)
            .filter(|&i| i < source.len()),
    );
    if source.is_empty() {
        offsets.clear();
    }
    offsets
}
