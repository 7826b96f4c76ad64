//! In-memory canonical issue list.
//!
//! Order is insertion order for the first population. Merges replace an
//! existing record at its current index and append anything new, so rows the
//! user is looking at never jump around on an incremental refresh.

use std::collections::HashMap;

use crate::issue::{Comment, IssueRecord};

/// Ordered, deduplicated collection of every known issue.
///
/// Not synchronized: a single owner performs all mutation.
#[derive(Debug, Default, Clone)]
pub struct IssueStore {
    issues: Vec<IssueRecord>,
    index: HashMap<String, usize>,
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything and adopt `issues` as the full set.
    ///
    /// A batch that repeats an id keeps the later record at the earlier position.
    pub fn refresh_issues(&mut self, issues: Vec<IssueRecord>) {
        self.issues.clear();
        self.index.clear();
        self.update_issues(issues);
        tracing::debug!("Issue store replaced, {} issues", self.issues.len());
    }

    /// Upsert by id: replace in place when known, append otherwise.
    pub fn update_issues(&mut self, issues: Vec<IssueRecord>) {
        let mut appended = 0usize;
        let mut replaced = 0usize;
        for issue in issues {
            match self.index.get(&issue.id) {
                Some(&position) => {
                    self.issues[position] = issue;
                    replaced += 1;
                }
                None => {
                    self.index.insert(issue.id.clone(), self.issues.len());
                    self.issues.push(issue);
                    appended += 1;
                }
            }
        }
        tracing::trace!(appended, replaced, "Merged issues into store");
    }

    pub fn get_all_issues(&self) -> &[IssueRecord] {
        &self.issues
    }

    /// Owned copy for handing to a view.
    pub fn snapshot(&self) -> Vec<IssueRecord> {
        self.issues.clone()
    }

    pub fn get(&self, id: &str) -> Option<&IssueRecord> {
        self.index.get(id).and_then(|&i| self.issues.get(i))
    }

    /// Cache comments fetched for one issue. Returns false if the issue is unknown.
    pub fn attach_comments(&mut self, id: &str, comments: Vec<Comment>) -> bool {
        match self.index.get(id).and_then(|&i| self.issues.get_mut(i)) {
            Some(issue) => {
                issue.comments = Some(comments);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn issue(id: &str, title: &str) -> IssueRecord {
        IssueRecord::new(id, title)
    }

    fn ids(store: &IssueStore) -> Vec<&str> {
        store.get_all_issues().iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn merge_keeps_position_of_existing_issue() {
        let mut store = IssueStore::new();
        store.refresh_issues(vec![issue("A", "a"), issue("B", "b"), issue("C", "c")]);

        store.update_issues(vec![issue("B", "b updated"), issue("D", "d")]);

        assert_eq!(ids(&store), vec!["A", "B", "C", "D"]);
        assert_eq!(store.get_all_issues()[1].title, "b updated");
    }

    #[test]
    fn merge_is_idempotent() {
        let mut once = IssueStore::new();
        once.refresh_issues(vec![issue("A", "a"), issue("B", "b")]);
        let batch = vec![issue("B", "b2"), issue("C", "c")];

        let mut twice = once.clone();
        once.update_issues(batch.clone());
        twice.update_issues(batch.clone());
        twice.update_issues(batch);

        assert_eq!(once.get_all_issues(), twice.get_all_issues());
    }

    #[test]
    fn merge_overwrites_whole_record() {
        let mut store = IssueStore::new();
        store.refresh_issues(vec![issue("A", "a")
            .with_description("details")
            .with_url("https://example.com/A")]);

        store.update_issues(vec![issue("A", "a")]);

        let merged = store.get("A").unwrap();
        assert!(merged.description.is_none());
        assert!(merged.url.is_none());
    }

    #[test]
    fn refresh_discards_prior_entries() {
        let mut store = IssueStore::new();
        store.refresh_issues(vec![issue("A", "a"), issue("B", "b"), issue("C", "c")]);

        store.refresh_issues(vec![issue("X", "x"), issue("B", "b")]);

        assert_eq!(ids(&store), vec!["X", "B"]);
        assert!(store.get("A").is_none());
        assert_eq!(store.get("B").unwrap().title, "b");
    }

    #[test]
    fn refresh_with_duplicate_ids_keeps_one_entry() {
        let mut store = IssueStore::new();
        store.refresh_issues(vec![issue("A", "first"), issue("B", "b"), issue("A", "second")]);

        assert_eq!(ids(&store), vec!["A", "B"]);
        assert_eq!(store.get("A").unwrap().title, "second");
    }

    #[test]
    fn attach_comments_updates_cached_record() {
        let mut store = IssueStore::new();
        store.refresh_issues(vec![issue("A", "a")]);
        let comments = vec![Comment {
            author: "henry".into(),
            text: "Reproduced".into(),
            created_at: None,
        }];

        assert!(store.attach_comments("A", comments.clone()));
        assert!(!store.attach_comments("missing", comments.clone()));
        assert_eq!(store.get("A").unwrap().comments, Some(comments));
    }

    #[test]
    fn snapshot_is_detached_from_store() {
        let mut store = IssueStore::new();
        store.refresh_issues(vec![issue("A", "a")]);
        let snapshot = store.snapshot();

        store.update_issues(vec![issue("A", "changed"), issue("B", "b")]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].title, "a");
        assert_eq!(store.len(), 2);
    }
}
