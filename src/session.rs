//! Multi-file review session.
//!
//! A [`Session`] is the aggregate view over a [`Status`]: a file cursor
//! across staged then unstaged files, plus at most one file opened for
//! hunk-by-hunk review. Replacing the status (after a refresh) goes
//! through [`Session::replace_status`] only.

use crate::diff::{Chunk, FileDiff};
use crate::fetch::Zone;
use crate::selection::SelectionState;
use crate::status::Status;

/// A file opened for review together with its selection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenReview {
    zone: Zone,
    diff: FileDiff,
    state: SelectionState,
}

impl OpenReview {
    fn new(zone: Zone, diff: FileDiff) -> Self {
        let state = SelectionState::new(&diff);
        Self { zone, diff, state }
    }

    pub fn filename(&self) -> &str {
        &self.diff.filename
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn diff(&self) -> &FileDiff {
        &self.diff
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SelectionState {
        &mut self.state
    }

    /// The focused chunk, unless it is already decided
    pub fn current_chunk(&self) -> Option<&Chunk> {
        self.state.current_chunk(&self.diff)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    status: Status,
    cursor: usize,
    open: Option<OpenReview>,
}

impl Session {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            cursor: 0,
            open: None,
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Index of the selected file within [`Status::files`]
    pub fn cursor(&self) -> Option<usize> {
        (!self.status.is_empty()).then_some(self.cursor)
    }

    pub fn select_next(&mut self) -> bool {
        if self.cursor + 1 < self.status.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn select_previous(&mut self) -> bool {
        if self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Select `filename`, returning false if it is not in the status
    pub fn select(&mut self, filename: &str) -> bool {
        match self.status.position(filename) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    pub fn selected(&self) -> Option<(Zone, &FileDiff)> {
        self.status.nth(self.cursor)
    }

    /// Open the selected file for review with a fresh selection state.
    ///
    /// Deleted files have nothing to review and are never opened.
    pub fn open_selected(&mut self) -> bool {
        let review = match self.selected() {
            Some((zone, diff)) if !diff.deleted() => OpenReview::new(zone, diff.clone()),
            _ => return false,
        };

        self.open = Some(review);
        true
    }

    /// Drop the open review and its progress
    pub fn close(&mut self) -> Option<OpenReview> {
        self.open.take()
    }

    pub fn review(&self) -> Option<&OpenReview> {
        self.open.as_ref()
    }

    pub fn review_mut(&mut self) -> Option<&mut OpenReview> {
        self.open.as_mut()
    }

    /// Move the selected file to the other zone.
    ///
    /// The file cursor follows the file. Any open review is discarded.
    pub fn toggle_selected(&mut self) -> Option<Zone> {
        let filename = self.selected()?.1.filename.clone();
        let zone = self.status.toggle_staged(&filename)?;

        self.open = None;
        if let Some(index) = self.status.position(&filename) {
            self.cursor = index;
        }

        Some(zone)
    }

    /// Install a freshly fetched status, returning false if nothing changed.
    ///
    /// The selection stays on the same filename when it still exists. An
    /// open review survives only if its file kept the same zone and diff.
    pub fn replace_status(&mut self, status: Status) -> bool {
        if status == self.status {
            return false;
        }

        let selected = self.selected().map(|(_, diff)| diff.filename.clone());
        self.status = status;

        self.cursor = selected
            .and_then(|name| self.status.position(&name))
            .unwrap_or_else(|| self.cursor.min(self.status.len().saturating_sub(1)));

        let unchanged = self.open.as_ref().is_some_and(|review| {
            self.status.get(review.filename()) == Some((review.zone, &review.diff))
        });
        if !unchanged {
            self.open = None;
        }

        true
    }
}
