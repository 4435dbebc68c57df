//! Linear navigation history with a movable cursor.

use crate::fork::Fork;
use serde::Serialize;

/// One visited item, optionally pinned to a specific fork's rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub item: String,
    pub fork: Option<Fork>,
}

/// Position-indexed navigation stack. Pushing truncates any forward entries
/// beyond the cursor; pushing the entry already under the cursor is a no-op.
#[derive(Debug, Clone, Default)]
pub struct NavigationHistory {
    entries: Vec<HistoryEntry>,
    /// Index of the current entry, when any exist.
    cursor: usize,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: impl Into<String>, fork: Option<Fork>) {
        let entry = HistoryEntry {
            item: item.into(),
            fork,
        };
        if self.current() == Some(&entry) {
            return;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    pub fn go_back(&mut self) -> Option<&HistoryEntry> {
        if !self.can_go_back() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    pub fn go_forward(&mut self) -> Option<&HistoryEntry> {
        if !self.can_go_forward() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    /// Reset point for version or mode switches.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(h: &NavigationHistory) -> Vec<&str> {
        h.entries.iter().map(|e| e.item.as_str()).collect()
    }

    #[test]
    fn push_back_push_truncates_forward_entries() {
        let mut h = NavigationHistory::new();
        h.push("A", None);
        h.push("B", None);
        h.push("C", None);
        assert_eq!(h.go_back().map(|e| e.item.as_str()), Some("B"));
        assert_eq!(h.go_back().map(|e| e.item.as_str()), Some("A"));
        h.push("D", None);
        assert_eq!(names(&h), ["A", "D"]);
        assert!(!h.can_go_forward());
        assert_eq!(h.current().map(|e| e.item.as_str()), Some("D"));
    }

    #[test]
    fn consecutive_duplicates_are_not_pushed() {
        let mut h = NavigationHistory::new();
        h.push("A", Some(Fork::Altair));
        h.push("A", Some(Fork::Altair));
        assert_eq!(h.len(), 1);
        // Same item under a different fork is a distinct entry.
        h.push("A", Some(Fork::Deneb));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn back_and_forward_walk_the_stack() {
        let mut h = NavigationHistory::new();
        assert!(h.go_back().is_none());
        h.push("A", None);
        h.push("B", None);
        assert!(h.can_go_back());
        assert!(!h.can_go_forward());
        h.go_back();
        assert!(h.can_go_forward());
        assert_eq!(h.go_forward().map(|e| e.item.as_str()), Some("B"));
    }

    #[test]
    fn clear_resets_everything() {
        let mut h = NavigationHistory::new();
        h.push("A", None);
        h.push("B", None);
        h.clear();
        assert!(h.is_empty());
        assert!(!h.can_go_back());
        assert!(!h.can_go_forward());
    }
}
