//! Selection state and the whole-document undo stack.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use crate::doc::{ItemId, Page};

/// The single selected item and whether it is in crop mode.
///
/// Crop mode always refers to the selected item; clearing or changing the
/// selection leaves crop mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<ItemId>,
    cropping: bool,
}

impl Selection {
    #[must_use]
    pub fn selected(&self) -> Option<&ItemId> {
        self.selected.as_ref()
    }

    /// The item in crop mode, if any.
    #[must_use]
    pub fn cropping(&self) -> Option<&ItemId> {
        if self.cropping { self.selected.as_ref() } else { None }
    }

    #[must_use]
    pub fn is_cropping(&self, id: &ItemId) -> bool {
        self.cropping().is_some_and(|c| c == id)
    }

    /// Select an item (or nothing). Selecting anything else exits crop mode.
    pub fn select(&mut self, id: Option<ItemId>) {
        if self.selected != id {
            self.cropping = false;
        }
        self.selected = id;
    }

    /// Flip crop mode on the selected item. Returns the new state.
    pub fn toggle_crop(&mut self) -> bool {
        self.cropping = self.selected.is_some() && !self.cropping;
        self.cropping
    }

    /// Drop the selection if it points at `id`.
    pub fn forget(&mut self, id: &ItemId) {
        if self.selected.as_ref() == Some(id) {
            self.select(None);
        }
    }
}

/// Bounded stack of page-list snapshots.
///
/// Snapshots are captured before item creation, drag commits, and deletions.
/// Restoring a snapshot is not supported.
#[derive(Debug, Clone)]
pub struct UndoStack {
    snapshots: VecDeque<Vec<Page>>,
    limit: usize,
}

impl UndoStack {
    /// A stack holding at most `limit` snapshots. A limit of zero disables capture.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { snapshots: VecDeque::new(), limit }
    }

    /// Record a snapshot, evicting the oldest when full.
    pub fn push(&mut self, pages: Vec<Page>) {
        if self.limit == 0 {
            return;
        }
        while self.snapshots.len() >= self.limit {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(pages);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Most recent snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&[Page]> {
        self.snapshots.back().map(Vec::as_slice)
    }
}
