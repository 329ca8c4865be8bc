//! Version-control operations the pipeline depends on.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use committer_core::CommitterError;
use git2::Repository;
use tracing::debug;

/// The git operations needed to split a working tree into commits.
///
/// Paths are relative to the repository root. Every mutating call either
/// succeeds or returns [`CommitterError::GitCommand`]; nothing is retried or
/// rolled back.
pub trait Vcs {
    /// Unified diff of the working tree against the index, restricted to
    /// `pathspec`, with `context` lines of context.
    fn diff(&self, pathspec: &str, context: u32) -> Result<String, CommitterError>;

    /// Contents of `path` at `HEAD`, or `None` if it does not exist there.
    fn show_head(&self, path: &Path) -> Result<Option<String>, CommitterError>;

    /// Contents of `path` in the working tree.
    fn read_worktree(&self, path: &Path) -> Result<String, CommitterError>;

    /// Apply `patch` to the index only.
    fn apply_cached(&self, patch: &str) -> Result<(), CommitterError>;

    /// Commit the index with `message`.
    fn commit(&self, message: &str) -> Result<(), CommitterError>;

    /// Fold the index into the previous commit, keeping its message.
    fn amend(&self) -> Result<(), CommitterError>;
}

/// [`Vcs`] backed by the `git` executable.
///
/// # Examples
///
/// ```no_run
/// use committer_git::{GitCli, Vcs};
/// use std::path::Path;
///
/// let git = GitCli::discover(Path::new("."), "git").unwrap();
/// let diff = git.diff("nongnu", 1).unwrap();
/// println!("{diff}");
/// ```
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    root: PathBuf,
}

impl GitCli {
    /// Use `program` against the work tree rooted at `root`.
    pub fn new(program: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            root: root.into(),
        }
    }

    /// Find the repository containing `path` and use its work tree root.
    ///
    /// # Errors
    ///
    /// Returns [`CommitterError::Git`] if `path` is not inside a repository
    /// or the repository is bare.
    pub fn discover(path: &Path, program: &str) -> Result<Self, CommitterError> {
        let repo = Repository::discover(path)
            .map_err(|e| CommitterError::Git(format!("failed to open repository: {e}")))?;
        let root = repo
            .workdir()
            .ok_or_else(|| CommitterError::Git("repository has no working tree".into()))?;
        debug!(root = %root.display(), "discovered repository");
        Ok(Self::new(program, root))
    }

    /// Work tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-C").arg(&self.root).args(args);
        cmd
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    fn run(&self, args: &[&str]) -> Result<Output, CommitterError> {
        debug!(command = %self.describe(args), "running git");
        self.command(args)
            .output()
            .map_err(|e| self.spawn_error(args, e))
    }

    fn run_checked(&self, args: &[&str]) -> Result<String, CommitterError> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(self.failure(args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_with_stdin(&self, args: &[&str], input: &str) -> Result<(), CommitterError> {
        debug!(command = %self.describe(args), bytes = input.len(), "running git with stdin");
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(args, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes())?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| self.spawn_error(args, e))?;
        if !output.status.success() {
            return Err(self.failure(args, &output));
        }
        Ok(())
    }

    fn spawn_error(&self, args: &[&str], err: std::io::Error) -> CommitterError {
        CommitterError::GitCommand {
            command: self.describe(args),
            detail: err.to_string(),
        }
    }

    fn failure(&self, args: &[&str], output: &Output) -> CommitterError {
        let stderr = String::from_utf8_lossy(&output.stderr);
        CommitterError::GitCommand {
            command: self.describe(args),
            detail: format!("{}: {}", output.status, stderr.trim()),
        }
    }
}

impl Vcs for GitCli {
    fn diff(&self, pathspec: &str, context: u32) -> Result<String, CommitterError> {
        let unified = format!("--unified={context}");
        self.run_checked(&[
            "diff",
            "--no-color",
            "--no-ext-diff",
            "--src-prefix=a/",
            "--dst-prefix=b/",
            &unified,
            "--",
            pathspec,
        ])
    }

    fn show_head(&self, path: &Path) -> Result<Option<String>, CommitterError> {
        let object = format!("HEAD:{}", path.display());
        let args = ["show", object.as_str()];
        let output = self.run(&args)?;
        if output.status.success() {
            return Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("does not exist") || stderr.contains("exists on disk, but not in") {
            return Ok(None);
        }
        Err(self.failure(&args, &output))
    }

    fn read_worktree(&self, path: &Path) -> Result<String, CommitterError> {
        Ok(std::fs::read_to_string(self.root.join(path))?)
    }

    fn apply_cached(&self, patch: &str) -> Result<(), CommitterError> {
        self.run_with_stdin(&["apply", "--cached", "--unidiff-zero", "-"], patch)
    }

    fn commit(&self, message: &str) -> Result<(), CommitterError> {
        self.run_with_stdin(&["commit", "--quiet", "-F", "-"], message)
    }

    fn amend(&self) -> Result<(), CommitterError> {
        self.run_checked(&["commit", "--quiet", "--amend", "--no-edit"])
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = GitCli::discover(dir.path(), "git").unwrap_err();
        assert!(matches!(err, CommitterError::Git(_)));
    }

    #[test]
    fn discover_finds_root_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let nested = dir.path().join("nongnu").join("packages");
        std::fs::create_dir_all(&nested).unwrap();

        let git = GitCli::discover(&nested, "git").unwrap();
        assert_eq!(
            git.root().canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn discover_rejects_bare_repository() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init_bare(dir.path()).unwrap();
        let err = GitCli::discover(dir.path(), "git").unwrap_err();
        assert!(err.to_string().contains("no working tree"));
    }

    #[test]
    fn read_worktree_is_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.scm"), "(define a 1)\n").unwrap();
        let git = GitCli::new("git", dir.path());
        assert_eq!(
            git.read_worktree(Path::new("a.scm")).unwrap(),
            "(define a 1)\n"
        );
    }

    #[test]
    fn missing_program_is_a_command_error() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new("committer-no-such-git-binary", dir.path());
        let err = git.commit("msg").unwrap_err();
        match err {
            CommitterError::GitCommand { command, .. } => {
                assert!(command.starts_with("committer-no-such-git-binary commit"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
