//! # Core Domain Entities
//!
//! Defines the match record, its identifiers and the query shapes used by
//! the store, the cache and the lifecycle engine.
//!
//! ## Identity
//!
//! A match has two identities:
//!
//! | Identity | Type | Used by |
//! |----------|------|---------|
//! | Generated id | [`MatchId`] (UUID v4) | clients, cache keys, events |
//! | Natural key | [`MatchKey`] `(tournament, round, match_number)` | bracket propagation merge |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tournament identifier assigned by the upstream tournament service.
pub type TournamentId = u64;

/// Generated primary handle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub Uuid);

impl MatchId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque player or team reference.
///
/// Upstream services send these either as strings (UUIDs) or as bare
/// integers; both deserialize into the same textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        let id = match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s,
            RawId::Unsigned(n) => n.to_string(),
            RawId::Signed(n) => n.to_string(),
        };
        if id.trim().is_empty() {
            return Err(serde::de::Error::custom("player id must not be empty"));
        }
        Ok(Self(id))
    }
}

/// One of the two participant positions of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    #[serde(alias = "a", alias = "player1")]
    A,
    #[serde(alias = "b", alias = "player2")]
    B,
}

impl Slot {
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => f.write_str("A"),
            Slot::B => f.write_str("B"),
        }
    }
}

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    PendingValidation,
    Completed,
    Cancelled,
}

impl MatchStatus {
    /// Terminal states have no outgoing edges.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Cancelled)
    }

    /// Wire name, as stored and as used in cache keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::PendingValidation => "pending_validation",
            MatchStatus::Completed => "completed",
            MatchStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bracket-position identity of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchKey {
    pub tournament_id: TournamentId,
    pub round: u32,
    pub match_number: u32,
}

impl MatchKey {
    #[must_use]
    pub fn new(tournament_id: TournamentId, round: u32, match_number: u32) -> Self {
        Self {
            tournament_id,
            round,
            match_number,
        }
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tournament {} round {} match {}",
            self.tournament_id, self.round, self.match_number
        )
    }
}

/// Persisted snapshot of a match.
///
/// The soft-delete marker is kept by the store and never leaves it; a
/// snapshot handed out is always of a live row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub round: u32,
    pub match_number: u32,
    pub slot_a: Option<PlayerId>,
    pub slot_b: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub player1_score: u32,
    pub player2_score: u32,
    pub status: MatchStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    #[must_use]
    pub fn key(&self) -> MatchKey {
        MatchKey::new(self.tournament_id, self.round, self.match_number)
    }

    #[must_use]
    pub fn slot(&self, slot: Slot) -> Option<&PlayerId> {
        match slot {
            Slot::A => self.slot_a.as_ref(),
            Slot::B => self.slot_b.as_ref(),
        }
    }

    /// Which slot (if any) the given player occupies.
    #[must_use]
    pub fn slot_of(&self, player: &PlayerId) -> Option<Slot> {
        if self.slot_a.as_ref() == Some(player) {
            Some(Slot::A)
        } else if self.slot_b.as_ref() == Some(player) {
            Some(Slot::B)
        } else {
            None
        }
    }

    #[must_use]
    pub fn has_players(&self) -> bool {
        self.slot_a.is_some() && self.slot_b.is_some()
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    #[must_use]
    pub fn can_start(&self) -> bool {
        self.status == MatchStatus::Scheduled && self.has_players()
    }

    #[must_use]
    pub fn can_complete(&self) -> bool {
        self.status == MatchStatus::InProgress
    }

    #[must_use]
    pub fn can_report_result(&self) -> bool {
        self.status == MatchStatus::InProgress
    }

    #[must_use]
    pub fn can_validate(&self) -> bool {
        self.status == MatchStatus::PendingValidation
    }
}

/// Insert request for a new match row. Status and scores are set by the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewMatch {
    pub key: MatchKey,
    pub slot_a: Option<PlayerId>,
    pub slot_b: Option<PlayerId>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: String,
}

impl Default for MatchKey {
    fn default() -> Self {
        Self::new(0, 1, 1)
    }
}

/// Field-level changes applied by a conditional write.
///
/// Only fields that are `Some` are written, so two writers touching
/// disjoint fields never clobber each other.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchPatch {
    pub status: Option<MatchStatus>,
    pub slot_a: Option<PlayerId>,
    pub slot_b: Option<PlayerId>,
    /// `Some(None)` clears the winner.
    pub winner: Option<Option<PlayerId>>,
    pub player1_score: Option<u32>,
    pub player2_score: Option<u32>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl MatchPatch {
    /// Patch writing a single slot.
    #[must_use]
    pub fn slot(slot: Slot, player: PlayerId) -> Self {
        match slot {
            Slot::A => Self {
                slot_a: Some(player),
                ..Self::default()
            },
            Slot::B => Self {
                slot_b: Some(player),
                ..Self::default()
            },
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply this patch to a snapshot in place.
    pub fn apply_to(&self, record: &mut Match) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(player) = &self.slot_a {
            record.slot_a = Some(player.clone());
        }
        if let Some(player) = &self.slot_b {
            record.slot_b = Some(player.clone());
        }
        if let Some(winner) = &self.winner {
            record.winner = winner.clone();
        }
        if let Some(score) = self.player1_score {
            record.player1_score = score;
        }
        if let Some(score) = self.player2_score {
            record.player2_score = score;
        }
        if let Some(at) = self.scheduled_at {
            record.scheduled_at = Some(at);
        }
        if let Some(at) = self.started_at {
            record.started_at = Some(at);
        }
        if let Some(at) = self.completed_at {
            record.completed_at = Some(at);
        }
        if let Some(notes) = &self.notes {
            record.notes = notes.clone();
        }
    }
}

/// Per-player detail record attached to a match. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerResult {
    pub id: Uuid,
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub score: u32,
    pub is_winner: bool,
    /// Open-ended statistics object (kills, accuracy, ...).
    pub stats: serde_json::Value,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Insert request for a [`PlayerResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlayerResult {
    pub match_id: MatchId,
    pub player_id: PlayerId,
    pub score: u32,
    pub is_winner: bool,
    pub stats: serde_json::Value,
    pub notes: String,
}

/// Optional filters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchFilter {
    pub tournament_id: Option<TournamentId>,
    pub status: Option<MatchStatus>,
}

impl MatchFilter {
    #[must_use]
    pub fn tournament(tournament_id: TournamentId) -> Self {
        Self {
            tournament_id: Some(tournament_id),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: MatchStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn matches(&self, record: &Match) -> bool {
        self.tournament_id.map_or(true, |t| record.tournament_id == t)
            && self.status.map_or(true, |s| record.status == s)
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    #[must_use]
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Number of rows to skip.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.page_size as usize
    }
}

/// A page of matches ordered by `(round, match_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPage {
    pub matches: Vec<Match>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl MatchPage {
    #[must_use]
    pub fn new(matches: Vec<Match>, total: u64, request: PageRequest) -> Self {
        let total_pages = if request.page_size == 0 {
            0
        } else {
            total.div_ceil(u64::from(request.page_size)) as u32
        };
        Self {
            matches,
            total,
            page: request.page,
            page_size: request.page_size,
            total_pages,
        }
    }
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Default wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
