//! # Bracket Propagator
//!
//! ```text
//! WinnerAdvanced ──→ get_by_key(target)
//!                      ├── absent  ──→ create(slot = winner) ──→ match.created
//!                      │                 └── DuplicateKey ──→ re-read, merge
//!                      └── present ──→ plan_slot
//!                                       ├── Fill ──→ conditional_update(status + vacant slot) ──→ match.updated
//!                                       ├── AlreadyApplied ──→ no-op
//!                                       └── contradiction / closed ──→ IntegrityError
//! ```

use crate::domain::{
    plan_slot, validate_key, validate_seed, PropagationOutcome, SeedingReport, SlotMerge,
};
use crate::ports::BracketPropagationApi;
use async_trait::async_trait;
use mf_01_match_store::{MatchStore, StoreError, WriteGuard};
use mf_02_match_cache::{CacheBackend, MatchCache};
use mf_05_event_gateway::MatchEventSink;
use shared_types::{
    BracketGenerated, ErrorKind, Match, MatchError, MatchEvent, MatchKey, MatchPatch,
    MatchResult, NewMatch, SeedPair, Slot, WinnerAdvanced,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Applies winner advancements and first-round seeding to the store.
pub struct BracketPropagator<S, B, E> {
    store: Arc<S>,
    cache: Arc<MatchCache<S, B>>,
    events: Arc<E>,
}

impl<S, B, E> BracketPropagator<S, B, E>
where
    S: MatchStore,
    B: CacheBackend,
    E: MatchEventSink,
{
    pub fn new(store: Arc<S>, cache: Arc<MatchCache<S, B>>, events: Arc<E>) -> Self {
        Self {
            store,
            cache,
            events,
        }
    }

    async fn merge(
        &self,
        target: Match,
        slot: Slot,
        event: &WinnerAdvanced,
    ) -> MatchResult<PropagationOutcome> {
        let plan = plan_slot(&target, slot, &event.winner).inspect_err(|err| {
            if err.kind() == ErrorKind::Integrity {
                error!(
                    match_id = %target.id,
                    key = %target.key(),
                    %slot,
                    winner = %event.winner,
                    source_match = ?event.source_match,
                    error = %err,
                    "Bracket integrity violation; slot left unchanged"
                );
            }
        })?;

        if plan == SlotMerge::AlreadyApplied {
            debug!(match_id = %target.id, %slot, winner = %event.winner, "Winner already in place");
            return Ok(PropagationOutcome::AlreadyApplied {
                match_id: target.id,
            });
        }

        let guard = WriteGuard::status(target.status).with_vacant(slot);
        let updated = self
            .store
            .conditional_update(target.id, guard, MatchPatch::slot(slot, event.winner.clone()))
            .await?;
        self.cache.invalidate(updated.id).await;

        let ready = updated.has_players();
        info!(
            match_id = %updated.id,
            tournament_id = updated.tournament_id,
            round = updated.round,
            match_number = updated.match_number,
            %slot,
            winner = %event.winner,
            "Winner advanced into slot"
        );
        if ready {
            info!(match_id = %updated.id, "Both slots filled; match ready to start");
        }
        self.events.emit(MatchEvent::Updated(updated.clone())).await;
        Ok(PropagationOutcome::SlotFilled {
            match_id: updated.id,
            ready,
        })
    }

    async fn insert(&self, new: NewMatch) -> Result<Match, StoreError> {
        let created = self.store.create(new).await?;
        self.cache.invalidate(created.id).await;
        self.events.emit(MatchEvent::Created(created.clone())).await;
        Ok(created)
    }

    async fn seed_one(&self, key: MatchKey, pair: &SeedPair) -> MatchResult<bool> {
        validate_seed(pair)?;
        if self.store.get_by_key(&key).await?.is_some() {
            return Ok(false);
        }
        let new = NewMatch {
            key,
            slot_a: pair.player1.clone(),
            slot_b: pair.player2.clone(),
            ..NewMatch::default()
        };
        match self.insert(new).await {
            Ok(_) => Ok(true),
            Err(StoreError::DuplicateKey(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<S, B, E> BracketPropagationApi for BracketPropagator<S, B, E>
where
    S: MatchStore,
    B: CacheBackend,
    E: MatchEventSink,
{
    async fn advance_winner(&self, event: WinnerAdvanced) -> MatchResult<PropagationOutcome> {
        validate_key(&event.target)?;
        let key = event.target;
        let slot = event.slot;

        if let Some(existing) = self.store.get_by_key(&key).await? {
            return self.merge(existing, slot, &event).await;
        }

        let new = NewMatch {
            key,
            ..NewMatch::default()
        };
        let new = match slot {
            Slot::A => NewMatch {
                slot_a: Some(event.winner.clone()),
                ..new
            },
            Slot::B => NewMatch {
                slot_b: Some(event.winner.clone()),
                ..new
            },
        };

        match self.insert(new).await {
            Ok(created) => {
                info!(
                    match_id = %created.id,
                    %key,
                    %slot,
                    winner = %event.winner,
                    "Created next-round match for advancing winner"
                );
                Ok(PropagationOutcome::Created {
                    match_id: created.id,
                })
            }
            Err(StoreError::DuplicateKey(_)) => {
                debug!(%key, "Lost insert race; merging into existing target");
                let existing = self.store.get_by_key(&key).await?.ok_or_else(|| {
                    MatchError::Conflict(format!("target {key} vanished during insert race"))
                })?;
                self.merge(existing, slot, &event).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn seed_bracket(&self, event: BracketGenerated) -> MatchResult<SeedingReport> {
        let mut report = SeedingReport::default();
        let mut transient: Option<MatchError> = None;
        let mut seed_failures = 0;

        for rejected in &event.rejected {
            report
                .failures
                .push(format!("seed #{}: {}", rejected.index, rejected.reason));
        }

        for pair in &event.seeds {
            let key = MatchKey::new(event.tournament_id, pair.round, pair.match_number);
            match self.seed_one(key, pair).await {
                Ok(true) => report.created += 1,
                Ok(false) => {
                    debug!(%key, "Seed position already populated");
                    report.skipped += 1;
                }
                Err(err) => {
                    warn!(%key, error = %err, "Seed pair failed; continuing with remaining pairs");
                    report.failures.push(format!("{key}: {err}"));
                    seed_failures += 1;
                    if err.kind() == ErrorKind::Transient && transient.is_none() {
                        transient = Some(err);
                    }
                }
            }
        }

        // Nothing landed and the store was unreachable: redeliver the whole bracket.
        if report.created == 0 && report.skipped == 0 {
            if let Some(err) = transient {
                if seed_failures == event.seeds.len() {
                    return Err(err);
                }
            }
        }

        info!(
            tournament_id = event.tournament_id,
            tournament_name = event.tournament_name.as_deref().unwrap_or(""),
            created = report.created,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Bracket seeding finished"
        );
        Ok(report)
    }
}
