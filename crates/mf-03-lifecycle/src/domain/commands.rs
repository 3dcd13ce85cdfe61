//! Command inputs accepted by the lifecycle engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{MatchPatch, PlayerId};

/// Reported, not yet validated, scores.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportResult {
    pub player1_score: u32,
    pub player2_score: u32,
    /// Who reported, for the audit trail only.
    #[serde(default)]
    pub reporter_id: Option<PlayerId>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Direct completion with final scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteMatch {
    pub player1_score: u32,
    pub player2_score: u32,
    pub winner: PlayerId,
}

/// Outcome of human validation of a reported result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ValidationDecision {
    /// Confirm the reported scores. The winner is the higher score unless
    /// overridden; a tied report needs the override.
    Accept {
        #[serde(default)]
        winner_override: Option<PlayerId>,
    },
    /// Discard the reported scores and send the match back to play.
    Reject {
        #[serde(default)]
        reason: Option<String>,
    },
}

/// Mutable fields of a non-terminal match. Status, winner and scores are
/// never touched here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchUpdate {
    #[serde(default)]
    pub slot_a: Option<PlayerId>,
    #[serde(default)]
    pub slot_b: Option<PlayerId>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MatchUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn into_patch(self) -> MatchPatch {
        MatchPatch {
            slot_a: self.slot_a,
            slot_b: self.slot_b,
            scheduled_at: self.scheduled_at,
            notes: self.notes,
            ..MatchPatch::default()
        }
    }
}

/// Per-player detail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub player_id: PlayerId,
    pub score: u32,
    #[serde(default)]
    pub is_winner: bool,
    /// Free-form statistics object.
    #[serde(default)]
    pub stats: serde_json::Value,
    #[serde(default)]
    pub notes: String,
}

/// Outcome of cancelling every open match of a tournament.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancellationReport {
    pub cancelled: usize,
    /// Matches that changed underneath us and were left alone.
    pub skipped: usize,
}
