//! # Inbound Decoding
//!
//! Turns a wire [`EventEnvelope`] into a typed [`InboundEvent`], once.
//!
//! | event_type | routing key | variant |
//! |------------|-------------|---------|
//! | `TOURNAMENT_CREATED` | `tournament.created` | `TournamentCreated` |
//! | `TOURNAMENT_UPDATED` | `tournament.updated` | `TournamentUpdated` |
//! | `TOURNAMENT_DELETED` | `tournament.deleted` | `TournamentDeleted` |
//! | `TOURNAMENT_STATUS_CHANGED` | `tournament.status.*` | `TournamentStatusChanged` |
//! | `BRACKET_GENERATED` | `tournament.bracket.generated` | `BracketGenerated` |
//! | `BRACKET_UPDATE_NEXT_MATCH` | `bracket.update.next_match` | `WinnerAdvanced` |
//!
//! The event type decides; the routing key is only consulted when the type
//! is missing. Anything else is `Unknown`.

use serde::Deserialize;
use serde_json::Value;
use shared_bus::{topic_matches, EventEnvelope};
use shared_types::{
    routing, BracketGenerated, InboundEvent, MatchKey, PlayerId, RejectedSeed, SeedPair, Slot,
    TournamentId, WinnerAdvanced,
};
use thiserror::Error;
use tracing::warn;

pub const TOURNAMENT_CREATED: &str = "TOURNAMENT_CREATED";
pub const TOURNAMENT_UPDATED: &str = "TOURNAMENT_UPDATED";
pub const TOURNAMENT_DELETED: &str = "TOURNAMENT_DELETED";
pub const TOURNAMENT_STATUS_CHANGED: &str = "TOURNAMENT_STATUS_CHANGED";
pub const BRACKET_GENERATED: &str = "BRACKET_GENERATED";
pub const BRACKET_UPDATE_NEXT_MATCH: &str = "BRACKET_UPDATE_NEXT_MATCH";

/// Permanent decoding failures. Redelivery cannot fix these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Missing field `{0}`")]
    MissingField(&'static str),

    #[error("Invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Malformed payload: {0}")]
    Malformed(String),
}

/// Decode an envelope into its typed event.
pub fn decode_inbound(envelope: &EventEnvelope) -> Result<InboundEvent, DecodeError> {
    let data = &envelope.data;
    match resolve_type(envelope) {
        Some(TOURNAMENT_CREATED) => Ok(InboundEvent::TournamentCreated {
            tournament_id: tournament_id(data)?,
            name: text(data, &["name", "tournament_name"]),
        }),
        Some(TOURNAMENT_UPDATED) => Ok(InboundEvent::TournamentUpdated {
            tournament_id: tournament_id(data)?,
        }),
        Some(TOURNAMENT_DELETED) => Ok(InboundEvent::TournamentDeleted {
            tournament_id: tournament_id(data)?,
        }),
        Some(TOURNAMENT_STATUS_CHANGED) => Ok(InboundEvent::TournamentStatusChanged {
            tournament_id: tournament_id(data)?,
            status: text(data, &["new_status", "status"])
                .or_else(|| envelope.routing_key.rsplit('.').next().map(str::to_string))
                .unwrap_or_default(),
        }),
        Some(BRACKET_GENERATED) => decode_bracket(data).map(InboundEvent::BracketGenerated),
        Some(BRACKET_UPDATE_NEXT_MATCH) => {
            decode_winner(data).map(InboundEvent::WinnerAdvanced)
        }
        _ => Ok(InboundEvent::Unknown {
            event_type: envelope.event_type.clone(),
        }),
    }
}

fn resolve_type(envelope: &EventEnvelope) -> Option<&'static str> {
    let known = [
        TOURNAMENT_CREATED,
        TOURNAMENT_UPDATED,
        TOURNAMENT_DELETED,
        TOURNAMENT_STATUS_CHANGED,
        BRACKET_GENERATED,
        BRACKET_UPDATE_NEXT_MATCH,
    ];
    if let Some(t) = known.iter().find(|t| **t == envelope.event_type) {
        return Some(*t);
    }
    if !envelope.event_type.is_empty() {
        return None;
    }

    let key = envelope.routing_key.as_str();
    match key {
        routing::TOURNAMENT_CREATED => Some(TOURNAMENT_CREATED),
        routing::TOURNAMENT_UPDATED => Some(TOURNAMENT_UPDATED),
        routing::TOURNAMENT_DELETED => Some(TOURNAMENT_DELETED),
        routing::BRACKET_GENERATED => Some(BRACKET_GENERATED),
        routing::BRACKET_NEXT_MATCH => Some(BRACKET_UPDATE_NEXT_MATCH),
        _ if topic_matches(routing::TOURNAMENT_STATUS, key) => Some(TOURNAMENT_STATUS_CHANGED),
        _ => None,
    }
}

/// Tournament id, sent as `tournament_id` or as the tournament's own `id`.
fn tournament_id(data: &Value) -> Result<TournamentId, DecodeError> {
    let raw = data
        .get("tournament_id")
        .or_else(|| data.get("id"))
        .ok_or(DecodeError::MissingField("tournament_id"))?;
    as_u64(raw).ok_or_else(|| DecodeError::InvalidField {
        field: "tournament_id",
        reason: format!("expected a non-negative integer, got {raw}"),
    })
}

fn as_u64(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(data: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|f| data.get(*f).and_then(Value::as_str))
        .map(str::to_string)
}

#[derive(Deserialize)]
struct RawSeed {
    round: Option<u32>,
    match_number: Option<u32>,
    #[serde(default, alias = "player1")]
    player1_id: Option<PlayerId>,
    #[serde(default, alias = "player2")]
    player2_id: Option<PlayerId>,
}

fn decode_bracket(data: &Value) -> Result<BracketGenerated, DecodeError> {
    let tournament_id = tournament_id(data)?;
    let entries = data
        .get("matches")
        .ok_or(DecodeError::MissingField("matches"))?
        .as_array()
        .ok_or_else(|| DecodeError::InvalidField {
            field: "matches",
            reason: "expected an array".to_string(),
        })?;

    let mut seeds = Vec::with_capacity(entries.len());
    let mut rejected = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        // A broken pair is skipped; the rest of the bracket still seeds.
        let reason = match RawSeed::deserialize(entry) {
            Ok(RawSeed {
                round: Some(round),
                match_number: Some(match_number),
                player1_id,
                player2_id,
            }) => {
                seeds.push(SeedPair {
                    round,
                    match_number,
                    player1: player1_id,
                    player2: player2_id,
                });
                continue;
            }
            Ok(RawSeed { round: None, .. }) => DecodeError::MissingField("round").to_string(),
            Ok(_) => DecodeError::MissingField("match_number").to_string(),
            Err(e) => DecodeError::Malformed(e.to_string()).to_string(),
        };
        warn!(tournament_id, index, %reason, "Rejected seed pair, skipping");
        rejected.push(RejectedSeed { index, reason });
    }

    Ok(BracketGenerated {
        tournament_id,
        tournament_name: text(data, &["tournament_name", "name"]),
        seeds,
        rejected,
    })
}

#[derive(Deserialize)]
struct RawWinner {
    round: Option<u32>,
    match_number: Option<u32>,
    winner_id: Option<PlayerId>,
    target_slot: Option<Slot>,
    is_player1: Option<bool>,
    previous_match_id: Option<Value>,
}

fn decode_winner(data: &Value) -> Result<WinnerAdvanced, DecodeError> {
    let tournament_id = tournament_id(data)?;
    let raw = RawWinner::deserialize(data).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let round = raw.round.ok_or(DecodeError::MissingField("round"))?;
    let match_number = raw
        .match_number
        .ok_or(DecodeError::MissingField("match_number"))?;
    let winner = raw.winner_id.ok_or(DecodeError::MissingField("winner_id"))?;
    let slot = match (raw.target_slot, raw.is_player1) {
        (Some(slot), _) => slot,
        (None, Some(true)) => Slot::A,
        (None, Some(false)) => Slot::B,
        (None, None) => return Err(DecodeError::MissingField("target_slot")),
    };
    if round == 0 || match_number == 0 {
        return Err(DecodeError::InvalidField {
            field: "round",
            reason: "bracket coordinates are one-based".to_string(),
        });
    }

    Ok(WinnerAdvanced {
        target: MatchKey::new(tournament_id, round, match_number),
        slot,
        winner,
        source_match: raw.previous_match_id.map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        }),
    })
}
