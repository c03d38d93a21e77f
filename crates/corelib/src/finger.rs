//! Finger tables.
//!
//! A finger table holds one entry per identifier bit. Entry `i` starts at
//! `(id + 2^i) mod 2^m` and points at the node that was the successor of that
//! start when the entry was last resolved. Targets are not kept live: they go
//! stale between joins until an explicit refresh recomputes them.

use crate::node::NodeHandle;
use crate::ring::IdSpace;

/// A single routing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerEntry {
    /// First identifier this entry is responsible for.
    pub start: u64,
    /// Resolved successor of `start`, if any resolution has happened yet.
    pub target: Option<NodeHandle>,
}

/// Ordered table of `m` fingers, shortest reach first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerTable {
    entries: Vec<FingerEntry>,
}

impl FingerTable {
    /// Builds the table shape for `id`: every start is computed, no target
    /// is resolved.
    pub fn new(space: IdSpace, id: u64) -> Self {
        let entries = (0..space.bits() as usize)
            .map(|i| FingerEntry {
                start: space.finger_start(id, i),
                target: None,
            })
            .collect();
        Self { entries }
    }

    /// Number of entries (`m`).
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, if in range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&FingerEntry> {
        self.entries.get(index)
    }

    /// Start of entry `index`.
    ///
    /// # Panics
    /// If `index >= len()`; callers iterate over `0..len()`.
    #[inline]
    pub fn start(&self, index: usize) -> u64 {
        self.entries[index].start
    }

    /// Resolved target of entry `index`, `None` if unresolved or out of range.
    #[inline]
    pub fn target(&self, index: usize) -> Option<NodeHandle> {
        self.entries.get(index).and_then(|entry| entry.target)
    }

    /// Points entry `index` at `target`. Out-of-range indexes are ignored.
    pub fn set(&mut self, index: usize, target: NodeHandle) {
        match self.entries.get_mut(index) {
            Some(entry) => entry.target = Some(target),
            None => tracing::error!(index, "finger index out of range"),
        }
    }

    /// Points every entry at `target`.
    pub fn fill(&mut self, target: NodeHandle) {
        for entry in &mut self.entries {
            entry.target = Some(target);
        }
    }

    /// True once every entry has a target.
    pub fn is_resolved(&self) -> bool {
        self.entries.iter().all(|entry| entry.target.is_some())
    }

    /// Entries from index 0 upwards.
    pub fn iter(&self) -> std::slice::Iter<'_, FingerEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a FingerTable {
    type Item = &'a FingerEntry;
    type IntoIter = std::slice::Iter<'a, FingerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_wrap_around_the_ring() {
        let table = FingerTable::new(IdSpace::default(), 1000);
        let starts: Vec<u64> = table.iter().map(|e| e.start).collect();
        assert_eq!(
            starts,
            vec![1001, 1002, 1004, 1008, 1016, 8, 40, 104, 232, 488]
        );
        assert_eq!(table.len(), 10);
        assert!(!table.is_resolved(), "New tables have no targets");
    }

    #[test]
    fn test_set_and_fill() {
        let mut table = FingerTable::new(IdSpace::new(4).unwrap(), 3);
        table.set(2, NodeHandle(7));
        assert_eq!(table.target(2), Some(NodeHandle(7)));
        assert_eq!(table.target(0), None);

        // Ignored rather than panicking.
        table.set(99, NodeHandle(1));
        assert_eq!(table.target(99), None);

        table.fill(NodeHandle(0));
        assert!(table.is_resolved());
        assert!(table.iter().all(|e| e.target == Some(NodeHandle(0))));
    }
}
