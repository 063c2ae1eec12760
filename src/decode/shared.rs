use std::fmt;

use smol_str::SmolStr;

use crate::constants::SHARED_TABLE_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Keys,
    Values,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Keys => f.write_str("key"),
            TableKind::Values => f.write_str("value"),
        }
    }
}

/// Back-reference table for one decode pass. Reaching capacity does not evict
/// the oldest entry: the next `add` starts over from an empty table.
#[derive(Debug, Clone)]
pub struct SharedTable {
    kind: TableKind,
    capacity: usize,
    entries: Vec<SmolStr>,
}

impl SharedTable {
    pub fn new(kind: TableKind) -> Self {
        Self::with_capacity(kind, SHARED_TABLE_CAPACITY)
    }

    pub fn with_capacity(kind: TableKind, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            kind,
            capacity,
            entries: Vec::with_capacity(capacity.min(64)),
        }
    }

    pub fn add(&mut self, value: impl Into<SmolStr>) {
        if self.entries.len() >= self.capacity {
            tracing::trace!(table = %self.kind, capacity = self.capacity, "shared table reset");
            self.entries.clear();
        }
        self.entries.push(value.into());
    }

    pub fn get(&self, index: usize) -> Option<&SmolStr> {
        self.entries.get(index)
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
