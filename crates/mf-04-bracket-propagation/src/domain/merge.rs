//! Slot merge rules for winner advancement.
//!
//! A slot is written at most once. Re-applying the same winner is a no-op;
//! a different winner is a contradiction the handler must not resolve.

use shared_types::{Match, MatchError, MatchKey, MatchResult, PlayerId, SeedPair, Slot};

/// What to do with a target match that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMerge {
    /// Slot is empty; write the winner.
    Fill,
    /// Slot already holds this winner.
    AlreadyApplied,
}

pub fn plan_slot(target: &Match, slot: Slot, winner: &PlayerId) -> MatchResult<SlotMerge> {
    match target.slot(slot) {
        Some(occupant) if occupant == winner => Ok(SlotMerge::AlreadyApplied),
        Some(occupant) => Err(MatchError::SlotContradiction {
            key: target.key(),
            slot,
            occupant: occupant.clone(),
            claimed: winner.clone(),
        }),
        None if target.is_terminal() => Err(MatchError::ClosedTarget {
            key: target.key(),
            status: target.status,
        }),
        None if target.slot(slot.other()) == Some(winner) => Err(MatchError::validation(
            format!(
                "player {winner} already occupies slot {} of {}",
                slot.other(),
                target.key()
            ),
        )),
        None => Ok(SlotMerge::Fill),
    }
}

pub fn validate_key(key: &MatchKey) -> MatchResult<()> {
    if key.round == 0 || key.match_number == 0 {
        return Err(MatchError::validation(format!(
            "bracket position {key} must be one-based"
        )));
    }
    Ok(())
}

pub fn validate_seed(pair: &SeedPair) -> MatchResult<()> {
    if pair.round == 0 || pair.match_number == 0 {
        return Err(MatchError::validation(format!(
            "seed {}/{} must be one-based",
            pair.round, pair.match_number
        )));
    }
    match (&pair.player1, &pair.player2) {
        (None, None) => Err(MatchError::validation(format!(
            "seed {}/{} has no players",
            pair.round, pair.match_number
        ))),
        (Some(a), Some(b)) if a == b => Err(MatchError::validation(format!(
            "seed {}/{} pairs {a} against itself",
            pair.round, pair.match_number
        ))),
        _ => Ok(()),
    }
}
