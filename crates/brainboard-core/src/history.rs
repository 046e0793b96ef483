//! Linear undo/redo over snapshots of the active layer.

use crate::element::Element;

/// Maximum number of history entries kept by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A deep copy of a layer's element sequence.
pub type Snapshot = Vec<Element>;

/// Bounded snapshot log with a cursor.
///
/// Always holds at least one entry; the cursor names the snapshot that
/// matches the active layer's current elements.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    entries: Vec<Snapshot>,
    cursor: usize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// Create a new log seeded with `initial`.
    pub fn new(initial: Snapshot, limit: usize) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Rebuild a log from persisted parts. Returns `None` if the log is
    /// empty or the cursor is out of range.
    pub fn from_parts(mut entries: Vec<Snapshot>, cursor: usize, limit: usize) -> Option<Self> {
        if cursor >= entries.len() {
            return None;
        }
        let limit = limit.max(1);
        // Keep the cursor entry when trimming an over-long persisted log.
        let excess = entries.len().saturating_sub(limit).min(cursor);
        entries.drain(..excess);
        Some(Self {
            entries,
            cursor: cursor - excess,
            limit,
        })
    }

    /// Record a new snapshot, discarding any redo tail.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
            log::debug!("history: evicted {excess} oldest entries");
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back. Returns the snapshot now under the cursor.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward. Returns the snapshot now under the cursor.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    /// Drop every entry and start over from `snapshot`.
    pub fn reset(&mut self, snapshot: Snapshot) {
        self.entries.clear();
        self.entries.push(snapshot);
        self.cursor = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    pub fn current(&self) -> &[Element] {
        self.entries.get(self.cursor).map_or(&[], Vec::as_slice)
    }
}
