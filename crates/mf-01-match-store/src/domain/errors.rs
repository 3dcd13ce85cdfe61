//! Store error types and their mapping onto the shared taxonomy.

use shared_types::{MatchError, MatchId, MatchKey, MatchStatus, PlayerId, Slot};
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a match or result store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Match {0} not found")]
    NotFound(MatchId),

    /// The conditional write saw a different status than the caller expected.
    #[error("Match {id} is {actual}, expected {expected}")]
    StatusConflict {
        id: MatchId,
        expected: MatchStatus,
        actual: MatchStatus,
    },

    /// The conditional write required an empty slot that has since been filled.
    #[error("Slot {slot} of match {id} is no longer vacant")]
    SlotOccupied { id: MatchId, slot: Slot },

    /// Unique constraint on the natural key among live rows.
    #[error("A live match already exists at {0}")]
    DuplicateKey(MatchKey),

    /// One result per (match, player).
    #[error("Result for player {player} on match {match_id} already recorded")]
    DuplicateResult { match_id: MatchId, player: PlayerId },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// Lost a race against another writer.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::StatusConflict { .. }
                | Self::SlotOccupied { .. }
                | Self::DuplicateKey(_)
                | Self::DuplicateResult { .. }
        )
    }
}

impl From<StoreError> for MatchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => MatchError::NotFound(format!("match {id}")),
            StoreError::Unavailable(_) | StoreError::Timeout(_) => {
                MatchError::Transient(err.to_string())
            }
            other => MatchError::Conflict(other.to_string()),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
