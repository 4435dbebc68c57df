//! Filter-state primitives: single-select facets and search debouncing.
//!
//! Every facet (fork, category, preset, runner) is single-select: picking a
//! value replaces the facet's previous selection, picking the selected value
//! again clears it. Multi-select within a facet does not exist.

use std::time::{Duration, Instant};

/// Outcome of a facet toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Selected,
    Cleared,
}

/// One mutually-exclusive filter facet.
#[derive(Debug, Clone)]
pub struct SingleSelect<T: PartialEq> {
    selected: Option<T>,
}

impl<T: PartialEq> Default for SingleSelect<T> {
    fn default() -> Self {
        Self { selected: None }
    }
}

impl<T: PartialEq> SingleSelect<T> {
    pub fn new() -> Self {
        Self { selected: None }
    }

    /// Toggle a value: re-clicking the selection clears the facet, anything
    /// else becomes the sole selection.
    pub fn toggle(&mut self, value: T) -> Toggle {
        if self.selected.as_ref() == Some(&value) {
            self.selected = None;
            Toggle::Cleared
        } else {
            self.selected = Some(value);
            Toggle::Selected
        }
    }

    pub fn selected(&self) -> Option<&T> {
        self.selected.as_ref()
    }

    pub fn is_selected(&self, value: &T) -> bool {
        self.selected.as_ref() == Some(value)
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_none()
    }
}

/// How long search input must stay idle before filtering work runs.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(150);

/// Debouncer for the free-text search box.
///
/// Facet button toggles are applied synchronously; only the text search is
/// debounced, so filtering runs at most once per idle window while the UI
/// stays responsive to clicks. Time is injected, so tests never sleep.
#[derive(Debug, Clone, Default)]
pub struct SearchDebouncer {
    pending: Option<String>,
    deadline: Option<Instant>,
}

impl SearchDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new search term; any not-yet-flushed term is replaced and
    /// the idle window restarts.
    pub fn submit(&mut self, term: impl Into<String>, now: Instant) {
        self.pending = Some(term.into());
        self.deadline = Some(now + SEARCH_DEBOUNCE);
    }

    /// Flush the pending term once the idle window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
