//! Snapshot-based undo/redo.
//!
//! A linear stack of whole-scene snapshots with a pointer at the current
//! entry. Committing while the pointer is behind the tail drops the redo
//! branch; exceeding the limit evicts the oldest entry.

use std::collections::VecDeque;
use tc_core::Snapshot;

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Snapshot>,
    /// Index of the current entry. Meaningless while `entries` is empty.
    pointer: usize,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(64)),
            pointer: 0,
            limit: limit.max(1),
        }
    }

    /// Record a new current state.
    pub fn commit(&mut self, snapshot: Snapshot) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.pointer + 1);
        }
        self.entries.push_back(snapshot);
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.pointer = self.entries.len() - 1;
    }

    /// Step back. Returns the snapshot to restore, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.pointer == 0 || self.entries.is_empty() {
            return None;
        }
        self.pointer -= 1;
        self.entries.get(self.pointer)
    }

    /// Step forward. Returns the snapshot to restore, or `None` at the tail.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.pointer + 1 >= self.entries.len() {
            return None;
        }
        self.pointer += 1;
        self.entries.get(self.pointer)
    }

    /// Forget everything and start over from `snapshot`.
    pub fn reset(&mut self, snapshot: Snapshot) {
        self.entries.clear();
        self.commit(snapshot);
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.entries.get(self.pointer)
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
