//! Grouping hunks by the definition they touch.

use std::path::PathBuf;

use committer_core::{ChangeKind, CommitterError, Hunk, MessageConfig, Revision};
use committer_git::Vcs;
use committer_sexp::Definition;
use serde::Serialize;
use tracing::debug;

use crate::sources::SourceCache;

/// Consecutive hunks of one file that change the same definition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HunkGroup {
    /// File the hunks belong to.
    pub file: PathBuf,
    /// Addition if any hunk introduces a definition.
    pub kind: ChangeKind,
    /// The definition as it reads in the working tree.
    pub new: Definition,
    /// The definition as it reads at `HEAD`; modifications only.
    pub old: Option<Definition>,
    /// Hunks in diff order.
    pub hunks: Vec<Hunk>,
}

impl HunkGroup {
    fn start(hunk: Hunk, new: Definition) -> Self {
        let kind = if hunk.introduces_definition {
            ChangeKind::Addition
        } else {
            ChangeKind::Modification
        };
        Self {
            file: hunk.file_path.clone(),
            kind,
            new,
            old: None,
            hunks: vec![hunk],
        }
    }

    fn accepts(&self, hunk: &Hunk, definition: &Definition) -> bool {
        self.file == hunk.file_path && self.new.same_form(definition)
    }

    fn push(&mut self, hunk: Hunk) {
        if hunk.introduces_definition {
            self.kind = ChangeKind::Addition;
        }
        self.hunks.push(hunk);
    }

    /// Name of what the group defines.
    ///
    /// Additions take the second token of the first added definition line;
    /// modifications take the name of the `HEAD` definition. Either falls
    /// back to the name read from the working-tree form.
    pub fn name(&self, definition_prefix: &str) -> Option<&str> {
        let from_hunks = match self.kind {
            ChangeKind::Addition => self
                .hunks
                .iter()
                .find_map(|hunk| hunk.defined_name(definition_prefix)),
            ChangeKind::Modification => self.old.as_ref().and_then(|old| old.name.as_deref()),
        };
        from_hunks.or(self.new.name.as_deref())
    }
}

/// Line of the working tree to look up for `hunk`.
fn new_side_line(hunk: &Hunk, definition_prefix: &str) -> u32 {
    if hunk.introduces_definition {
        if let Some((line, _)) = hunk.first_added_definition(definition_prefix) {
            return line;
        }
    }
    hunk.new_lookup_line()
}

/// Fold `hunks` into groups, then pair each modification with its `HEAD`
/// definition.
///
/// A hunk joins the group before it only if both sit in the same file and
/// their working-tree definitions are structurally equal; otherwise it starts
/// a new group.
///
/// # Errors
///
/// Fails if any hunk has no enclosing definition on the side it is looked up
/// on, or if a file cannot be read.
pub fn group_hunks<V: Vcs>(
    hunks: Vec<Hunk>,
    sources: &mut SourceCache<'_, V>,
    config: &MessageConfig,
) -> Result<Vec<HunkGroup>, CommitterError> {
    let mut groups: Vec<HunkGroup> = Vec::new();

    for hunk in hunks {
        let line = new_side_line(&hunk, &config.definition_prefix);
        let definition = sources.definition_at(&hunk.file_path, line, Revision::WorkTree, config)?;
        match groups.last_mut() {
            Some(group) if group.accepts(&hunk, &definition) => group.push(hunk),
            _ => groups.push(HunkGroup::start(hunk, definition)),
        }
    }

    for group in &mut groups {
        if group.kind == ChangeKind::Modification {
            let line = group.hunks[0].old_lookup_line();
            let old = sources.definition_at(&group.file, line, Revision::Head, config)?;
            group.old = Some(old);
        }
        debug!(
            file = %group.file.display(),
            kind = %group.kind,
            hunks = group.hunks.len(),
            "grouped hunks"
        );
    }

    Ok(groups)
}
