//! # Error Types
//!
//! The error taxonomy shared by the lifecycle engine, the propagation
//! handler and the event gateway.
//!
//! | Kind | Command path | Event path |
//! |------|--------------|------------|
//! | Validation | surfaced | acked, recorded |
//! | Conflict | surfaced as retryable | requeued |
//! | NotFound | surfaced | acked, recorded |
//! | Integrity | n/a | acked, recorded |
//! | Transient | surfaced | requeued |

use crate::entities::{MatchKey, MatchStatus, PlayerId, Slot};
use thiserror::Error;

/// Coarse classification used for retry and acknowledgement decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Integrity,
    Transient,
}

/// Errors produced by match operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MatchError {
    /// Malformed input or a violated precondition.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The requested operation has no edge from the current status.
    #[error("Illegal transition: cannot {operation} a match that is {status}")]
    IllegalTransition {
        operation: &'static str,
        status: MatchStatus,
    },

    /// A conditional write lost a race.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown id or key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Propagation found a slot held by a different winner.
    #[error("Integrity violation at {key}: slot {slot} holds {occupant}, event claims {claimed}")]
    SlotContradiction {
        key: MatchKey,
        slot: Slot,
        occupant: PlayerId,
        claimed: PlayerId,
    },

    /// Propagation targeted a match that can no longer accept players.
    #[error("Integrity violation at {key}: target match is {status}")]
    ClosedTarget { key: MatchKey, status: MatchStatus },

    /// Store, cache or bus unreachable or timed out.
    #[error("Transient infrastructure error: {0}")]
    Transient(String),
}

impl MatchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::IllegalTransition { .. } => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::SlotContradiction { .. } | Self::ClosedTarget { .. } => ErrorKind::Integrity,
            Self::Transient(_) => ErrorKind::Transient,
        }
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conflict | ErrorKind::Transient)
    }
}

/// Result type for match operations.
pub type MatchResult<T> = Result<T, MatchError>;
