//! Bounded in-memory log of recent analyses.
//!
//! Lives only as long as the process. Newest records come first; once the
//! log is full the oldest record is evicted.

use crate::models::analysis::AnalysisRecord;
use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

pub struct HistoryLog {
    capacity: usize,
    records: Mutex<VecDeque<AnalysisRecord>>,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<AnalysisRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert `record` at the front, or replace the entry with the same id
    /// in place.
    pub fn save(&self, record: AnalysisRecord) {
        let mut records = self.lock();
        if let Some(existing) = records.iter_mut().find(|r| r.id == record.id) {
            *existing = record;
            return;
        }
        records.push_front(record);
        records.truncate(self.capacity);
    }

    /// Snapshot, newest first.
    pub fn list(&self) -> Vec<AnalysisRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
