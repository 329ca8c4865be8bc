use std::collections::HashMap;
use std::path::{Path, PathBuf};

use committer_core::{CommitterError, MessageConfig, Revision};
use committer_git::Vcs;
use committer_sexp::{surrounding_form, Definition};
use tracing::debug;

/// File contents for one hunk computation, read at most once per file and
/// revision.
pub struct SourceCache<'a, V: Vcs> {
    vcs: &'a V,
    worktree: HashMap<PathBuf, String>,
    head: HashMap<PathBuf, Option<String>>,
}

impl<'a, V: Vcs> SourceCache<'a, V> {
    pub fn new(vcs: &'a V) -> Self {
        Self {
            vcs,
            worktree: HashMap::new(),
            head: HashMap::new(),
        }
    }

    /// Text of `file` at `revision`; `None` when it is absent from `HEAD`.
    pub fn text(&mut self, file: &Path, revision: Revision) -> Result<Option<&str>, CommitterError> {
        match revision {
            Revision::WorkTree => {
                if !self.worktree.contains_key(file) {
                    let text = self.vcs.read_worktree(file)?;
                    self.worktree.insert(file.to_path_buf(), text);
                }
                Ok(self.worktree.get(file).map(String::as_str))
            }
            Revision::Head => {
                if !self.head.contains_key(file) {
                    let text = self.vcs.show_head(file)?;
                    self.head.insert(file.to_path_buf(), text);
                }
                Ok(self.head.get(file).and_then(|text| text.as_deref()))
            }
        }
    }

    /// The definition enclosing `line` of `file` at `revision`.
    ///
    /// # Errors
    ///
    /// Returns [`CommitterError::NoEnclosingDefinition`] if no top-level form
    /// starts at or above `line`, and [`CommitterError::Syntax`] if a form on
    /// the way cannot be read.
    pub fn definition_at(
        &mut self,
        file: &Path,
        line: u32,
        revision: Revision,
        message: &MessageConfig,
    ) -> Result<Definition, CommitterError> {
        let missing = || CommitterError::NoEnclosingDefinition {
            file: file.to_path_buf(),
            line,
            revision,
        };

        let Some(text) = self.text(file, revision)? else {
            return Err(missing());
        };
        let form = surrounding_form(text, line as usize)
            .map_err(|e| CommitterError::Syntax {
                file: file.to_path_buf(),
                revision,
                line: e.line,
                message: e.message,
            })?
            .ok_or_else(missing)?;

        debug!(
            file = %file.display(),
            line,
            %revision,
            start = form.start_line,
            end = form.end_line,
            "found enclosing form"
        );
        Ok(Definition::from_form(
            form,
            &message.version_field,
            &message.tracked_fields,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeVcs;

    const FILE: &str = "nongnu/packages/demo.scm";

    #[test]
    fn finds_definition_in_both_revisions() {
        let vcs = FakeVcs::new()
            .with_worktree(FILE, "(define-public foo\n  (package (version \"2\")))\n")
            .with_head(FILE, "(define-public foo\n  (package (version \"1\")))\n");
        let mut sources = SourceCache::new(&vcs);
        let config = MessageConfig::default();

        let new = sources
            .definition_at(Path::new(FILE), 2, Revision::WorkTree, &config)
            .unwrap();
        let old = sources
            .definition_at(Path::new(FILE), 2, Revision::Head, &config)
            .unwrap();
        assert_eq!(new.version.as_deref(), Some("2"));
        assert_eq!(old.version.as_deref(), Some("1"));
    }

    #[test]
    fn file_missing_from_head_has_no_definition() {
        let vcs = FakeVcs::new().with_worktree(FILE, "(define-public foo 1)\n");
        let mut sources = SourceCache::new(&vcs);
        let err = sources
            .definition_at(Path::new(FILE), 1, Revision::Head, &MessageConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            CommitterError::NoEnclosingDefinition {
                revision: Revision::Head,
                line: 1,
                ..
            }
        ));
    }

    #[test]
    fn unbalanced_form_is_a_syntax_error() {
        let vcs = FakeVcs::new().with_worktree(FILE, "(define-public foo\n  (package\n");
        let mut sources = SourceCache::new(&vcs);
        let err = sources
            .definition_at(Path::new(FILE), 2, Revision::WorkTree, &MessageConfig::default())
            .unwrap_err();
        assert!(matches!(err, CommitterError::Syntax { .. }));
    }
}
