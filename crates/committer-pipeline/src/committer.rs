//! The commit loop: diff, group, stage, commit, repeat.

use std::path::PathBuf;

use committer_changelog::copyright::{added_copyright_holders, is_copyright_update};
use committer_changelog::{CommitMessage, MessageBuilder, MessageOverride};
use committer_core::{ChangeKind, CommitterConfig, CommitterError, Hunk};
use committer_difflens::filter::PathFilter;
use committer_difflens::parser::parse_hunks;
use committer_git::Vcs;
use serde::Serialize;
use tracing::{debug, info};

use crate::group::{group_hunks, HunkGroup};
use crate::sources::SourceCache;

/// A commit made (or, in a dry run, planned) for one group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// File the group belongs to.
    pub file: PathBuf,
    /// Addition or modification.
    pub kind: ChangeKind,
    /// Name of the definition.
    pub name: String,
    /// Number of hunks staged for the commit.
    pub hunks: usize,
    /// The message used.
    pub message: CommitMessage,
}

/// Copyright lines folded into the previous commit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Amendment {
    /// Files whose copyright lines were staged.
    pub files: Vec<PathBuf>,
    /// Holders named on the added lines.
    pub holders: Vec<String>,
}

/// What a run did, in order.
///
/// # Examples
///
/// ```
/// use committer_pipeline::RunReport;
///
/// let report = RunReport::default();
/// assert!(report.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Whether staging and committing were skipped.
    pub dry_run: bool,
    /// Copyright amendment, if there was one.
    pub amendment: Option<Amendment>,
    /// Commits in the order they were made.
    pub commits: Vec<CommitRecord>,
}

impl RunReport {
    /// Whether the run found nothing to do.
    pub fn is_empty(&self) -> bool {
        self.amendment.is_none() && self.commits.is_empty()
    }
}

/// Splits the working-tree changes of a channel into one commit per
/// definition.
pub struct Committer<'a, V: Vcs> {
    vcs: &'a V,
    config: &'a CommitterConfig,
    filter: PathFilter,
    messages: MessageBuilder,
    message_override: Option<MessageOverride>,
}

impl<'a, V: Vcs> Committer<'a, V> {
    /// Build a committer over `vcs`.
    ///
    /// # Errors
    ///
    /// Returns [`CommitterError::Config`] if a path glob is invalid.
    pub fn new(
        vcs: &'a V,
        config: &'a CommitterConfig,
        message_override: Option<MessageOverride>,
    ) -> Result<Self, CommitterError> {
        Ok(Self {
            vcs,
            config,
            filter: PathFilter::from_config(&config.channel)?,
            messages: MessageBuilder::new(&config.channel, &config.message),
            message_override,
        })
    }

    /// Diff the channel subtree and keep the hunks the path filter accepts.
    pub fn compute_hunks(&self) -> Result<Vec<Hunk>, CommitterError> {
        let diff = self
            .vcs
            .diff(&self.config.channel.subtree, self.config.git.context_lines)?;
        let hunks = parse_hunks(&diff, &self.config.message.definition_prefix)?;
        let hunks = self.filter.retain(hunks);
        debug!(hunks = hunks.len(), "computed hunks");
        Ok(hunks)
    }

    fn group(&self, hunks: Vec<Hunk>) -> Result<Vec<HunkGroup>, CommitterError> {
        let mut sources = SourceCache::new(self.vcs);
        group_hunks(hunks, &mut sources, &self.config.message)
    }

    /// The commit message for `group`.
    ///
    /// # Errors
    ///
    /// Returns [`CommitterError::UnnamedDefinition`] if the group's
    /// definition has no name.
    pub fn message_for(&self, group: &HunkGroup) -> Result<CommitMessage, CommitterError> {
        let name = self.name_of(group)?;
        if let Some(ov) = &self.message_override {
            return Ok(self.messages.custom(&group.file, name, ov));
        }
        let message = match (&group.kind, &group.old) {
            (ChangeKind::Modification, Some(old)) => {
                self.messages.modification(&group.file, name, old, &group.new)
            }
            _ => self
                .messages
                .addition(&group.file, name, group.new.version.as_deref()),
        };
        Ok(message)
    }

    fn name_of<'g>(&self, group: &'g HunkGroup) -> Result<&'g str, CommitterError> {
        group
            .name(&self.config.message.definition_prefix)
            .ok_or_else(|| CommitterError::UnnamedDefinition {
                file: group.file.clone(),
                line: group.new.start_line,
            })
    }

    fn record(&self, group: &HunkGroup) -> Result<CommitRecord, CommitterError> {
        Ok(CommitRecord {
            file: group.file.clone(),
            kind: group.kind,
            name: self.name_of(group)?.to_string(),
            hunks: group.hunks.len(),
            message: self.message_for(group)?,
        })
    }

    /// Describe the commits a run would make, without touching the index.
    ///
    /// Copyright hunks are reported as an amendment and left out of the
    /// groups. Additions are listed first, then everything else from the
    /// same grouping; a real run regroups after committing additions, so
    /// later groups may differ slightly.
    pub fn plan(&self) -> Result<RunReport, CommitterError> {
        let (copyright, hunks): (Vec<Hunk>, Vec<Hunk>) = self
            .compute_hunks()?
            .into_iter()
            .partition(is_copyright_update);

        let groups = self.group(hunks)?;
        let (additions, rest): (Vec<&HunkGroup>, Vec<&HunkGroup>) = groups
            .iter()
            .partition(|group| group.kind == ChangeKind::Addition);

        let commits = additions
            .into_iter()
            .chain(rest)
            .map(|group| self.record(group))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RunReport {
            dry_run: true,
            amendment: amendment_for(&copyright),
            commits,
        })
    }

    /// Stage and commit every change in the channel subtree.
    ///
    /// Copyright lines are folded into the previous commit first. Then every
    /// addition is committed, the diff is recomputed from scratch, and every
    /// remaining group is committed. A failing git call stops the run at
    /// once, leaving the index as it is.
    pub fn run(&self) -> Result<RunReport, CommitterError> {
        let mut report = RunReport::default();

        let mut hunks = self.compute_hunks()?;
        if hunks.is_empty() {
            return Ok(report);
        }

        let copyright: Vec<Hunk> = hunks
            .iter()
            .filter(|h| is_copyright_update(h))
            .cloned()
            .collect();
        if let Some(amendment) = amendment_for(&copyright) {
            for hunk in &copyright {
                self.apply(hunk)?;
            }
            self.vcs.amend()?;
            self.pause();
            for holder in &amendment.holders {
                info!(holder = %holder, "amended previous commit with copyright line");
            }
            report.amendment = Some(amendment);
            hunks = self.compute_hunks()?;
        }

        for group in self.group(hunks)? {
            if group.kind == ChangeKind::Addition {
                report.commits.push(self.commit_group(&group)?);
            }
        }

        let remaining = self.compute_hunks()?;
        for group in self.group(remaining)? {
            report.commits.push(self.commit_group(&group)?);
        }

        Ok(report)
    }

    fn commit_group(&self, group: &HunkGroup) -> Result<CommitRecord, CommitterError> {
        let record = self.record(group)?;
        for hunk in &group.hunks {
            self.apply(hunk)?;
        }
        self.vcs.commit(&record.message.to_string())?;
        self.pause();
        info!(
            file = %record.file.display(),
            kind = %record.kind,
            "committed: {}",
            record.message.summary
        );
        Ok(record)
    }

    fn apply(&self, hunk: &Hunk) -> Result<(), CommitterError> {
        self.vcs.apply_cached(&hunk.to_patch())?;
        self.pause();
        Ok(())
    }

    fn pause(&self) {
        std::thread::sleep(self.config.git.delay());
    }
}

fn amendment_for(hunks: &[Hunk]) -> Option<Amendment> {
    if hunks.is_empty() {
        return None;
    }
    let mut files: Vec<PathBuf> = Vec::new();
    for hunk in hunks {
        if !files.contains(&hunk.file_path) {
            files.push(hunk.file_path.clone());
        }
    }
    let holders = hunks
        .iter()
        .flat_map(|hunk| added_copyright_holders(hunk.added_lines()))
        .collect();
    Some(Amendment { files, holders })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeVcs};

    const FILE: &str = "nongnu/packages/demo.scm";

    const HEAD: &str = "\
(define-module (nongnu packages demo))

(define-public foo
  (package
    (name \"foo\")
    (version \"1.0\")
    (inputs (list zlib))))

;;; Tools
;;;
;;; More packages below.
";

    const WORKTREE: &str = "\
(define-module (nongnu packages demo))

(define-public foo
  (package
    (name \"foo\")
    (version \"1.1\")
    (inputs (list zlib openssl))))

;;; Tools
;;;
;;; More packages below.

(define-public bar
  (package
    (name \"bar\")
    (version \"2.0\")))
";

    const FOO_HUNK: &str = "\
@@ -5,4 +5,4 @@
     (name \"foo\")
-    (version \"1.0\")
-    (inputs (list zlib))))
+    (version \"1.1\")
+    (inputs (list zlib openssl))))

";

    const BAR_HUNK: &str = "\
@@ -11 +11,6 @@
 ;;; More packages below.
+
+(define-public bar
+  (package
+    (name \"bar\")
+    (version \"2.0\")))
";

    fn diff(hunks: &[&str]) -> String {
        let mut out = format!(
            "diff --git a/{FILE} b/{FILE}\nindex 1111111..2222222 100644\n--- a/{FILE}\n+++ b/{FILE}\n"
        );
        for hunk in hunks {
            out.push_str(hunk);
        }
        out
    }

    fn config() -> CommitterConfig {
        let mut config = CommitterConfig::default();
        config.git.delay_ms = 0;
        config
    }

    fn vcs() -> FakeVcs {
        FakeVcs::new()
            .with_worktree(FILE, WORKTREE)
            .with_head(FILE, HEAD)
    }

    #[test]
    fn empty_diff_makes_no_changes() {
        let vcs = FakeVcs::new();
        let config = config();
        let report = Committer::new(&vcs, &config, None).unwrap().run().unwrap();
        assert!(report.is_empty());
        assert_eq!(vcs.calls(), vec![Call::Diff]);
    }

    #[test]
    fn additions_are_committed_before_recomputing() {
        let vcs = vcs()
            .with_diff(&diff(&[FOO_HUNK, BAR_HUNK]))
            .with_diff(&diff(&[FOO_HUNK]));
        let config = config();
        let report = Committer::new(&vcs, &config, None).unwrap().run().unwrap();

        let calls = vcs.calls();
        assert_eq!(calls.len(), 6);
        assert_eq!(calls[0], Call::Diff);
        assert!(matches!(&calls[1], Call::Apply(p) if p.contains("+(define-public bar")));
        assert!(matches!(&calls[2], Call::Commit(m) if m.starts_with("nongnu: bar: Update to 2.0.")));
        assert_eq!(calls[3], Call::Diff);
        assert!(matches!(&calls[4], Call::Apply(p) if p.contains("openssl")));
        assert!(matches!(&calls[5], Call::Commit(_)));

        assert_eq!(
            vcs.commits(),
            vec![
                "nongnu: bar: Update to 2.0.\n\n\
                 * nongnu/packages/demo.scm (bar): New variable.\n"
                    .to_string(),
                "nongnu: foo: Update to 1.1.\n\n\
                 * nongnu/packages/demo.scm (foo): Update to 1.1.\n\
                 [inputs]: Add openssl.\n"
                    .to_string(),
            ]
        );
        assert_eq!(report.commits.len(), 2);
        assert_eq!(report.commits[0].kind, ChangeKind::Addition);
        assert_eq!(report.commits[1].name, "foo");
        assert!(!report.dry_run);
    }

    #[test]
    fn staged_patch_is_the_hunk_verbatim() {
        let vcs = vcs().with_diff(&diff(&[BAR_HUNK]));
        let config = config();
        Committer::new(&vcs, &config, None).unwrap().run().unwrap();

        let Call::Apply(patch) = &vcs.calls()[1] else {
            panic!("expected an apply call");
        };
        assert_eq!(
            patch,
            &format!("diff --git a/{FILE} b/{FILE}\n--- a/{FILE}\n+++ b/{FILE}\n{BAR_HUNK}")
        );
    }

    #[test]
    fn failed_apply_stops_before_committing() {
        let vcs = vcs()
            .with_diff(&diff(&[FOO_HUNK, BAR_HUNK]))
            .failing_apply();
        let config = config();
        let err = Committer::new(&vcs, &config, None).unwrap().run().unwrap_err();

        assert!(matches!(err, CommitterError::GitCommand { .. }));
        assert_eq!(vcs.calls().len(), 2);
        assert!(vcs.commits().is_empty());
    }

    #[test]
    fn override_message_is_used_for_every_group() {
        let vcs = vcs()
            .with_diff(&diff(&[FOO_HUNK, BAR_HUNK]))
            .with_diff(&diff(&[FOO_HUNK]));
        let config = config();
        let ov = MessageOverride::new("Fix build.", Some("[arguments]: Fix build."));
        Committer::new(&vcs, &config, Some(ov)).unwrap().run().unwrap();

        assert_eq!(
            vcs.commits(),
            vec![
                "nongnu: bar: Fix build.\n\n* nongnu/packages/demo.scm (bar)[arguments]: Fix build.\n"
                    .to_string(),
                "nongnu: foo: Fix build.\n\n* nongnu/packages/demo.scm (foo)[arguments]: Fix build.\n"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn copyright_lines_amend_the_previous_commit() {
        let head = ";;; Copyright © 2020 Old Holder\n(define-module (x))\n";
        let worktree =
            ";;; Copyright © 2020 Old Holder\n;;; Copyright © 2024 New Holder\n(define-module (x))\n";
        let copyright = diff(&["\
@@ -1 +1,2 @@
 ;;; Copyright © 2020 Old Holder
+;;; Copyright © 2024 New Holder
"]);
        let vcs = FakeVcs::new()
            .with_worktree(FILE, worktree)
            .with_head(FILE, head)
            .with_diff(&copyright);
        let config = config();
        let report = Committer::new(&vcs, &config, None).unwrap().run().unwrap();

        let calls = vcs.calls();
        assert_eq!(calls.len(), 5);
        assert!(matches!(&calls[1], Call::Apply(p) if p.contains("New Holder")));
        assert_eq!(calls[2], Call::Amend);
        assert_eq!(&calls[3..], &[Call::Diff, Call::Diff]);

        let amendment = report.amendment.unwrap();
        assert_eq!(amendment.holders, vec!["New Holder"]);
        assert_eq!(amendment.files, vec![PathBuf::from(FILE)]);
        assert!(report.commits.is_empty());
    }

    #[test]
    fn copyright_header_of_a_new_file_is_committed_with_it() {
        let fresh = "nongnu/packages/fresh.scm";
        let worktree = "\
;;; Copyright © 2024 New Holder

(define-module (nongnu packages fresh))

(define-public qux
  (package
    (name \"qux\")
    (version \"0.1\")))
";
        let mut new_file = format!(
            "diff --git a/{fresh} b/{fresh}\nnew file mode 100644\n\
             index 0000000..3333333\n--- /dev/null\n+++ b/{fresh}\n@@ -0,0 +1,8 @@\n"
        );
        for line in worktree.lines() {
            new_file.push('+');
            new_file.push_str(line);
            new_file.push('\n');
        }
        let vcs = FakeVcs::new()
            .with_worktree(fresh, worktree)
            .with_diff(&new_file);
        let config = config();
        let report = Committer::new(&vcs, &config, None).unwrap().run().unwrap();

        let calls = vcs.calls();
        assert!(!calls.contains(&Call::Amend));
        assert!(matches!(
            &calls[1],
            Call::Apply(p) if p.contains("new file mode 100644\n--- /dev/null\n")
        ));
        assert_eq!(
            vcs.commits(),
            vec!["nongnu: qux: Update to 0.1.\n\n\
                  * nongnu/packages/fresh.scm (qux): New variable.\n"
                .to_string()]
        );
        assert!(report.amendment.is_none());
        assert_eq!(report.commits[0].kind, ChangeKind::Addition);
    }

    #[test]
    fn copyright_line_beside_a_code_change_is_not_amended() {
        let head = "(define-public w 0)\n;;; Copyright © 2020 Old Holder\n(define-public x\n  1)\n";
        let worktree =
            "(define-public w 0)\n;;; Copyright © 2024 New Holder\n(define-public x\n  2)\n";
        let mixed = diff(&["\
@@ -2,3 +2,3 @@
-;;; Copyright © 2020 Old Holder
+;;; Copyright © 2024 New Holder
 (define-public x
-  1)
+  2)
"]);
        let vcs = FakeVcs::new()
            .with_worktree(FILE, worktree)
            .with_head(FILE, head)
            .with_diff(&mixed);
        let config = config();
        let report = Committer::new(&vcs, &config, None).unwrap().plan().unwrap();

        assert!(report.amendment.is_none());
        assert_eq!(report.commits.len(), 1);
        assert_eq!(report.commits[0].kind, ChangeKind::Modification);
    }

    #[test]
    fn change_outside_definitions_is_fatal_and_commits_nothing() {
        let vcs = FakeVcs::new()
            .with_worktree(FILE, ";;; header\n;;; more\n(define-module (x))\n")
            .with_head(FILE, ";;; header\n(define-module (x))\n")
            .with_diff(&diff(&["@@ -1 +1,2 @@\n ;;; header\n+;;; more\n"]));
        let config = config();
        let err = Committer::new(&vcs, &config, None).unwrap().run().unwrap_err();

        assert!(matches!(err, CommitterError::NoEnclosingDefinition { .. }));
        assert_eq!(vcs.calls(), vec![Call::Diff]);
    }

    #[test]
    fn files_outside_the_filter_are_ignored() {
        let readme = "diff --git a/nongnu/README b/nongnu/README\n\
                      --- a/nongnu/README\n+++ b/nongnu/README\n@@ -1 +1 @@\n-old\n+new\n";
        let vcs = FakeVcs::new().with_diff(readme);
        let config = config();
        let report = Committer::new(&vcs, &config, None).unwrap().run().unwrap();
        assert!(report.is_empty());
        assert_eq!(vcs.calls(), vec![Call::Diff]);
    }

    #[test]
    fn plan_lists_additions_first_without_touching_the_index() {
        let vcs = vcs().with_diff(&diff(&[FOO_HUNK, BAR_HUNK]));
        let config = config();
        let report = Committer::new(&vcs, &config, None).unwrap().plan().unwrap();

        assert!(report.dry_run);
        let names: Vec<&str> = report.commits.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["bar", "foo"]);
        assert_eq!(vcs.calls(), vec![Call::Diff]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["commits"][0]["kind"], "addition");
        assert_eq!(
            json["commits"][1]["message"]["summary"],
            "nongnu: foo: Update to 1.1."
        );
    }
}
