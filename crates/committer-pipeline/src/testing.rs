//! Recording in-memory [`Vcs`] for tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use committer_core::CommitterError;
use committer_git::Vcs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Diff,
    Apply(String),
    Commit(String),
    Amend,
}

/// Serves queued diffs and fixed file contents, and records every call.
#[derive(Default)]
pub struct FakeVcs {
    diffs: RefCell<VecDeque<String>>,
    worktree: HashMap<PathBuf, String>,
    head: HashMap<PathBuf, String>,
    calls: RefCell<Vec<Call>>,
    fail_apply: bool,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output of the next `diff` call. Once the queue is drained
    /// `diff` returns an empty string.
    pub fn with_diff(self, diff: &str) -> Self {
        self.diffs.borrow_mut().push_back(diff.to_string());
        self
    }

    pub fn with_worktree(mut self, path: &str, text: &str) -> Self {
        self.worktree.insert(PathBuf::from(path), text.to_string());
        self
    }

    pub fn with_head(mut self, path: &str, text: &str) -> Self {
        self.head.insert(PathBuf::from(path), text.to_string());
        self
    }

    pub fn failing_apply(mut self) -> Self {
        self.fail_apply = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Commit(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Vcs for FakeVcs {
    fn diff(&self, _pathspec: &str, _context: u32) -> Result<String, CommitterError> {
        self.record(Call::Diff);
        Ok(self.diffs.borrow_mut().pop_front().unwrap_or_default())
    }

    fn show_head(&self, path: &Path) -> Result<Option<String>, CommitterError> {
        Ok(self.head.get(path).cloned())
    }

    fn read_worktree(&self, path: &Path) -> Result<String, CommitterError> {
        self.worktree.get(path).cloned().ok_or_else(|| {
            CommitterError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not in fake work tree", path.display()),
            ))
        })
    }

    fn apply_cached(&self, patch: &str) -> Result<(), CommitterError> {
        self.record(Call::Apply(patch.to_string()));
        if self.fail_apply {
            return Err(CommitterError::GitCommand {
                command: "git apply --cached --unidiff-zero -".into(),
                detail: "exit status: 1: error: patch does not apply".into(),
            });
        }
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<(), CommitterError> {
        self.record(Call::Commit(message.to_string()));
        Ok(())
    }

    fn amend(&self) -> Result<(), CommitterError> {
        self.record(Call::Amend);
        Ok(())
    }
}
