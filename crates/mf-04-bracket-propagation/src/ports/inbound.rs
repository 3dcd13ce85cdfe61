//! # Inbound Ports (Driving Ports)
//!
//! Driven by the inbound event router.

use crate::domain::{PropagationOutcome, SeedingReport};
use async_trait::async_trait;
use shared_types::{BracketGenerated, MatchResult, WinnerAdvanced};

/// Bracket propagation API.
#[async_trait]
pub trait BracketPropagationApi: Send + Sync {
    /// Ensure the target match exists with the winner in the target slot.
    ///
    /// Duplicate deliveries resolve to [`PropagationOutcome::AlreadyApplied`].
    /// A slot held by a different player fails with
    /// `MatchError::SlotContradiction` and is left untouched.
    async fn advance_winner(&self, event: WinnerAdvanced) -> MatchResult<PropagationOutcome>;

    /// Insert one match per seed pair. Per-pair failures are collected in the
    /// report instead of aborting the run.
    async fn seed_bracket(&self, event: BracketGenerated) -> MatchResult<SeedingReport>;
}
