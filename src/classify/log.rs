//! Error Log Module
//!
//! Bounded in-memory log of classified errors.

use std::collections::VecDeque;

use super::ErrorRecord;

// == Error Log ==
/// Ring buffer of classified errors.
///
/// Once `capacity` is reached the oldest record is dropped for each new one;
/// dropped records are counted so callers can tell the log wrapped.
#[derive(Debug)]
pub struct ErrorLog {
    /// Records in arrival order (front = oldest)
    records: VecDeque<ErrorRecord>,
    /// Maximum number of retained records
    capacity: usize,
    /// Records discarded because the buffer was full
    dropped: u64,
}

impl ErrorLog {
    // == Constructor ==
    /// Creates an empty log. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            dropped: 0,
        }
    }

    // == Push ==
    /// Appends a record, evicting the oldest when full.
    pub fn push(&mut self, record: ErrorRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
            self.dropped += 1;
        }
        self.records.push_back(record);
    }

    // == Snapshot ==
    /// Returns a copy of all retained records, oldest first.
    pub fn snapshot(&self) -> Vec<ErrorRecord> {
        self.records.iter().cloned().collect()
    }

    // == Clear ==
    /// Removes all records and resets the dropped counter.
    pub fn clear(&mut self) {
        self.records.clear();
        self.dropped = 0;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
