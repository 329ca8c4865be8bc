/// Join items the way English prose does: `a`, `a and b`, `a, b, and c`.
///
/// # Examples
///
/// ```
/// use committer_changelog::clause::listify;
///
/// assert_eq!(listify(&["x"]), "x");
/// assert_eq!(listify(&["x", "y"]), "x and y");
/// assert_eq!(listify(&["x", "y", "z"]), "x, y, and z");
/// ```
pub fn listify<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [one] => one.as_ref().to_string(),
        [one, two] => format!("{} and {}", one.as_ref(), two.as_ref()),
        [init @ .., last] => {
            let init: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{}, and {}", init.join(", "), last.as_ref())
        }
    }
}

/// Entries removed and added between two versions of a list field.
///
/// Both sides keep the order in which entries appear in their own list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChanges {
    /// In the old list but not the new one.
    pub removed: Vec<String>,
    /// In the new list but not the old one.
    pub added: Vec<String>,
}

impl EntryChanges {
    /// Compute the set differences between `old` and `new`.
    pub fn between(old: &[String], new: &[String]) -> Self {
        let removed = old.iter().filter(|e| !new.contains(e)).cloned().collect();
        let added = new.iter().filter(|e| !old.contains(e)).cloned().collect();
        Self { removed, added }
    }

    /// Whether the entries are the same set on both sides.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Render as a ChangeLog clause, or `None` when nothing was added or
    /// removed (a pure reordering).
    ///
    /// # Examples
    ///
    /// ```
    /// use committer_changelog::clause::EntryChanges;
    ///
    /// let old = vec!["x".to_string(), "y".to_string()];
    /// let new = vec!["x".to_string(), "y".to_string(), "z".to_string()];
    /// assert_eq!(EntryChanges::between(&old, &new).clause().as_deref(), Some("Add z."));
    /// ```
    pub fn clause(&self) -> Option<String> {
        match (self.removed.is_empty(), self.added.is_empty()) {
            (true, true) => None,
            (true, false) => Some(format!("Add {}.", listify(&self.added))),
            (false, true) => Some(format!("Remove {}.", listify(&self.removed))),
            (false, false) => Some(format!(
                "Remove {}; add {}.",
                listify(&self.removed),
                listify(&self.added)
            )),
        }
    }
}

/// Clause describing how a list field changed, if it did.
pub fn field_change_clause(old: &[String], new: &[String]) -> Option<String> {
    if old == new {
        return None;
    }
    EntryChanges::between(old, new).clause()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn listify_four_items() {
        assert_eq!(listify(&["a", "b", "c", "d"]), "a, b, c, and d");
    }

    #[test]
    fn listify_empty() {
        assert_eq!(listify::<&str>(&[]), "");
    }

    #[test]
    fn adding_one_entry() {
        let clause = field_change_clause(&list(&["x", "y"]), &list(&["x", "y", "z"]));
        assert_eq!(clause.as_deref(), Some("Add z."));
    }

    #[test]
    fn removing_two_entries() {
        let clause = field_change_clause(&list(&["x", "y", "z"]), &list(&["x"]));
        assert_eq!(clause.as_deref(), Some("Remove y and z."));
    }

    #[test]
    fn removing_three_entries() {
        let clause = field_change_clause(&list(&["a", "b", "c", "d"]), &list(&["d"]));
        assert_eq!(clause.as_deref(), Some("Remove a, b, and c."));
    }

    #[test]
    fn adding_two_entries_to_empty() {
        let clause = field_change_clause(&[], &list(&["a", "b"]));
        assert_eq!(clause.as_deref(), Some("Add a and b."));
    }

    #[test]
    fn remove_and_add() {
        let clause = field_change_clause(&list(&["a", "b"]), &list(&["b", "c"]));
        assert_eq!(clause.as_deref(), Some("Remove a; add c."));
    }

    #[test]
    fn diffing_is_symmetric() {
        let a = list(&["gtk", "glib", "zlib"]);
        let b = list(&["glib", "openssl", "curl"]);
        let forward = EntryChanges::between(&a, &b);
        let backward = EntryChanges::between(&b, &a);
        assert_eq!(forward.removed, backward.added);
        assert_eq!(forward.added, backward.removed);
        assert_eq!(
            forward.clause().as_deref(),
            Some("Remove gtk and zlib; add openssl and curl.")
        );
        assert_eq!(
            backward.clause().as_deref(),
            Some("Remove openssl and curl; add gtk and zlib.")
        );
    }

    #[test]
    fn reordering_yields_no_clause() {
        let clause = field_change_clause(&list(&["a", "b"]), &list(&["b", "a"]));
        assert_eq!(clause, None);
    }

    #[test]
    fn unchanged_yields_no_clause() {
        assert_eq!(field_change_clause(&list(&["a"]), &list(&["a"])), None);
    }
}
