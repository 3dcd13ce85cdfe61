use shared_types::{Match, MatchStatus, Slot};

/// Precondition checked atomically with a conditional write.
///
/// The write applies only if the persisted row still has `expected_status`
/// and, when `vacant_slot` is set, that slot is still empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteGuard {
    pub expected_status: MatchStatus,
    pub vacant_slot: Option<Slot>,
}

impl WriteGuard {
    #[must_use]
    pub fn status(expected_status: MatchStatus) -> Self {
        Self {
            expected_status,
            vacant_slot: None,
        }
    }

    #[must_use]
    pub fn with_vacant(mut self, slot: Slot) -> Self {
        self.vacant_slot = Some(slot);
        self
    }

    /// Whether the guard holds for the given row.
    #[must_use]
    pub fn admits(&self, record: &Match) -> bool {
        record.status == self.expected_status
            && self.vacant_slot.map_or(true, |slot| record.slot(slot).is_none())
    }
}

impl From<MatchStatus> for WriteGuard {
    fn from(status: MatchStatus) -> Self {
        Self::status(status)
    }
}
