//! Per-file hunk review state.
//!
//! A [`SelectionState`] walks a cursor over one [`FileDiff`]'s chunks and
//! records a decision per chunk. Decisions are keyed by the chunk's
//! position in the immutable `chunks` list and undone in reverse order.
//!
//! The cursor rules after a decision or an undo are neighbour heuristics:
//! deciding steps forward (or back, at the last chunk); undoing steps back
//! (or forward, at the first chunk). Undo restores decisions exactly but
//! only approximately restores the cursor.

use std::collections::BTreeMap;

use crate::diff::{Chunk, FileDiff};

/// What the reviewer decided for a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Committed,
    Skipped,
}

/// Cursor and decision history over one file's chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    chunk_count: usize,
    deleted: bool,
    /// `None` only when the file has no chunks
    cursor: Option<usize>,
    decided: BTreeMap<usize, Outcome>,
    /// Decided chunk indices, most recent last
    history: Vec<usize>,
}

impl SelectionState {
    /// Fresh state for reviewing `diff`, focused on its first chunk
    pub fn new(diff: &FileDiff) -> Self {
        Self {
            chunk_count: diff.chunks.len(),
            deleted: diff.deleted(),
            cursor: (!diff.chunks.is_empty()).then_some(0),
            decided: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Decided chunk indices in the order the decisions were made
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    pub fn outcome(&self, index: usize) -> Option<Outcome> {
        self.decided.get(&index).copied()
    }

    /// All decisions, ordered by chunk index
    pub fn decisions(&self) -> impl Iterator<Item = (usize, Outcome)> + '_ {
        self.decided.iter().map(|(index, outcome)| (*index, *outcome))
    }

    /// Step to the next chunk, stopping at the last. Returns whether it moved.
    pub fn move_cursor_forward(&mut self) -> bool {
        match self.cursor {
            Some(index) if index + 1 < self.chunk_count => {
                self.cursor = Some(index + 1);
                true
            }
            _ => false,
        }
    }

    /// Step to the previous chunk, stopping at the first. Returns whether it moved.
    pub fn move_cursor_backward(&mut self) -> bool {
        match self.cursor {
            Some(index) if index > 0 => {
                self.cursor = Some(index - 1);
                true
            }
            _ => false,
        }
    }

    /// Mark the focused chunk committed. Returns its index, or `None` when
    /// nothing was decided.
    pub fn commit(&mut self) -> Option<usize> {
        self.decide(Outcome::Committed)
    }

    /// Mark the focused chunk skipped. Returns its index, or `None` when
    /// nothing was decided.
    pub fn skip(&mut self) -> Option<usize> {
        self.decide(Outcome::Skipped)
    }

    fn decide(&mut self, outcome: Outcome) -> Option<usize> {
        if self.all_decided() {
            return None;
        }

        // A chunk is decided at most once between undos
        let index = self.cursor.filter(|i| !self.decided.contains_key(i))?;
        self.decided.insert(index, outcome);
        self.history.push(index);

        if !self.move_cursor_forward() {
            self.move_cursor_backward();
        }

        Some(index)
    }

    /// Revert the most recent decision, returning it
    pub fn undo(&mut self) -> Option<(usize, Outcome)> {
        let index = self.history.pop()?;
        let outcome = self.decided.remove(&index);

        if !self.move_cursor_backward() {
            self.move_cursor_forward();
        }

        outcome.map(|outcome| (index, outcome))
    }

    fn all_decided(&self) -> bool {
        self.history.len() == self.chunk_count
    }

    /// True once every chunk has a decision, or the file was deleted
    pub fn complete(&self) -> bool {
        self.deleted || self.all_decided()
    }

    /// Chunks still waiting for a decision
    pub fn remaining_count(&self) -> usize {
        self.chunk_count.saturating_sub(self.history.len())
    }

    /// Index of the focused chunk, unless it is already decided
    pub fn current_index(&self) -> Option<usize> {
        self.cursor.filter(|index| !self.decided.contains_key(index))
    }

    /// The focused chunk of `diff`, unless it is already decided
    pub fn current_chunk<'a>(&self, diff: &'a FileDiff) -> Option<&'a Chunk> {
        debug_assert_eq!(diff.chunks.len(), self.chunk_count);
        self.current_index().and_then(|index| diff.chunks.get(index))
    }

    /// `(position, remaining)` for an "i/n" display, where `position` is the
    /// 1-based rank of the focused chunk among the undecided ones
    pub fn progress(&self) -> Option<(usize, usize)> {
        let index = self.current_index()?;
        let position = (0..index)
            .filter(|i| !self.decided.contains_key(i))
            .count()
            + 1;

        Some((position, self.remaining_count()))
    }
}
