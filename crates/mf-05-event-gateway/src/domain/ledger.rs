//! Record of acknowledged-but-failed inbound work, for operators.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

/// Why an inbound unit of work was given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Malformed,
    Validation,
    NotFound,
    Integrity,
    /// One pair of a bulk seeding that could not be inserted.
    PartialSeed,
}

/// One recorded failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedFailure {
    pub event_id: Uuid,
    pub event_type: String,
    pub routing_key: String,
    pub class: FailureClass,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

/// Bounded in-memory failure ledger. Oldest entries are evicted first.
pub struct FailureLedger {
    entries: RwLock<VecDeque<RecordedFailure>>,
    capacity: usize,
}

impl FailureLedger {
    pub const DEFAULT_CAPACITY: usize = 1024;

    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, failure: RecordedFailure) {
        let mut entries = self.entries.write();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(failure);
    }

    #[must_use]
    pub fn entries(&self) -> Vec<RecordedFailure> {
        self.entries.read().iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn count(&self, class: FailureClass) -> usize {
        self.entries.read().iter().filter(|f| f.class == class).count()
    }
}

impl Default for FailureLedger {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
