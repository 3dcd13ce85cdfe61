//! # Domain Events
//!
//! Typed payloads for every event this service emits or consumes.
//! Decoding from the wire happens once, at the gateway boundary; everything
//! past it works on these variants.

use crate::entities::{Match, MatchId, MatchKey, PlayerId, PlayerResult, Slot, TournamentId};
use serde::{Deserialize, Serialize};

/// Outbound routing keys.
pub mod routing {
    pub const MATCH_CREATED: &str = "match.created";
    pub const MATCH_UPDATED: &str = "match.updated";
    pub const MATCH_STARTED: &str = "match.started";
    pub const MATCH_COMPLETED: &str = "match.completed";
    pub const MATCH_CANCELLED: &str = "match.cancelled";
    pub const MATCH_DELETED: &str = "match.deleted";
    pub const RESULT_REPORTED: &str = "match.result.reported";
    pub const RESULT_RECORDED: &str = "match.result.recorded";
    pub const MATCH_FINISHED: &str = "match.finished";
    pub const RESULT_REJECTED: &str = "match.result.rejected";

    pub const TOURNAMENT_CREATED: &str = "tournament.created";
    pub const TOURNAMENT_UPDATED: &str = "tournament.updated";
    pub const TOURNAMENT_DELETED: &str = "tournament.deleted";
    pub const TOURNAMENT_STATUS: &str = "tournament.status.*";
    pub const BRACKET_GENERATED: &str = "tournament.bracket.generated";
    pub const BRACKET_NEXT_MATCH: &str = "bracket.update.next_match";
}

/// Events published after a successful state change.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    Created(Match),
    Updated(Match),
    Started(Match),
    Completed(Match),
    Cancelled(Match),
    Deleted(Match),
    ResultReported(Match),
    ResultRecorded(PlayerResult),
    /// Result validated; the upstream bracket service advances the winner.
    Finished(Match),
    ResultRejected(Match),
}

impl MatchEvent {
    #[must_use]
    pub fn routing_key(&self) -> &'static str {
        match self {
            Self::Created(_) => routing::MATCH_CREATED,
            Self::Updated(_) => routing::MATCH_UPDATED,
            Self::Started(_) => routing::MATCH_STARTED,
            Self::Completed(_) => routing::MATCH_COMPLETED,
            Self::Cancelled(_) => routing::MATCH_CANCELLED,
            Self::Deleted(_) => routing::MATCH_DELETED,
            Self::ResultReported(_) => routing::RESULT_REPORTED,
            Self::ResultRecorded(_) => routing::RESULT_RECORDED,
            Self::Finished(_) => routing::MATCH_FINISHED,
            Self::ResultRejected(_) => routing::RESULT_REJECTED,
        }
    }

    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => "MATCH_CREATED",
            Self::Updated(_) => "MATCH_UPDATED",
            Self::Started(_) => "MATCH_STARTED",
            Self::Completed(_) => "MATCH_COMPLETED",
            Self::Cancelled(_) => "MATCH_CANCELLED",
            Self::Deleted(_) => "MATCH_DELETED",
            Self::ResultReported(_) => "MATCH_RESULT_REPORTED",
            Self::ResultRecorded(_) => "RESULT_RECORDED",
            Self::Finished(_) => "MATCH_FINISHED",
            Self::ResultRejected(_) => "MATCH_RESULT_REJECTED",
        }
    }

    #[must_use]
    pub fn match_id(&self) -> MatchId {
        match self {
            Self::ResultRecorded(result) => result.match_id,
            Self::Created(m)
            | Self::Updated(m)
            | Self::Started(m)
            | Self::Completed(m)
            | Self::Cancelled(m)
            | Self::Deleted(m)
            | Self::ResultReported(m)
            | Self::Finished(m)
            | Self::ResultRejected(m) => m.id,
        }
    }

    /// JSON body carried in the envelope's `data` field.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::ResultRecorded(result) => serde_json::to_value(result),
            Self::Created(m)
            | Self::Updated(m)
            | Self::Started(m)
            | Self::Completed(m)
            | Self::Cancelled(m)
            | Self::Deleted(m)
            | Self::ResultReported(m)
            | Self::Finished(m)
            | Self::ResultRejected(m) => serde_json::to_value(m),
        }
    }
}

/// A first-round pairing from a generated bracket. Either side may be a bye.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPair {
    pub round: u32,
    pub match_number: u32,
    pub player1: Option<PlayerId>,
    pub player2: Option<PlayerId>,
}

/// A bracket entry that could not be read as a [`SeedPair`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSeed {
    /// Position in the event's `matches` array.
    pub index: usize,
    pub reason: String,
}

/// Bulk first-round seeding for a tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketGenerated {
    pub tournament_id: TournamentId,
    pub tournament_name: Option<String>,
    pub seeds: Vec<SeedPair>,
    /// Entries dropped while decoding; reported alongside seeding failures.
    pub rejected: Vec<RejectedSeed>,
}

/// "Winner advances" instruction: put `winner` into `slot` of the match at `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerAdvanced {
    pub target: MatchKey,
    pub slot: Slot,
    pub winner: PlayerId,
    /// Id of the finished match that produced the winner, for tracing only.
    pub source_match: Option<String>,
}

/// Inbound events, one variant per consumed event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    TournamentCreated {
        tournament_id: TournamentId,
        name: Option<String>,
    },
    TournamentUpdated {
        tournament_id: TournamentId,
    },
    TournamentDeleted {
        tournament_id: TournamentId,
    },
    TournamentStatusChanged {
        tournament_id: TournamentId,
        status: String,
    },
    BracketGenerated(BracketGenerated),
    WinnerAdvanced(WinnerAdvanced),
    /// Forward-compatible catch-all; logged and acknowledged.
    Unknown { event_type: String },
}

impl InboundEvent {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::TournamentCreated { .. } => "tournament_created",
            Self::TournamentUpdated { .. } => "tournament_updated",
            Self::TournamentDeleted { .. } => "tournament_deleted",
            Self::TournamentStatusChanged { .. } => "tournament_status_changed",
            Self::BracketGenerated(_) => "bracket_generated",
            Self::WinnerAdvanced(_) => "winner_advanced",
            Self::Unknown { event_type } => event_type,
        }
    }
}
