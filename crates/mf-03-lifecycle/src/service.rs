//! # Lifecycle Service
//!
//! Every state-changing operation runs the same pipeline:
//!
//! ```text
//! store.get_by_id ──→ plan (pure precondition check)
//!        ──→ store.conditional_update(guard = prior status)
//!        ──→ cache.invalidate(id + lists)
//!        ──→ events.emit(exactly one event)
//! ```
//!
//! Preconditions are always checked against the persisted row, never a
//! cached snapshot. A concurrent writer that changed the status in between
//! makes the conditional write fail with `Conflict`.

use crate::domain::transitions::{
    check_delete, plan_accept, plan_cancel, plan_complete, plan_reject, plan_report, plan_start,
    plan_update,
};
use crate::domain::{
    CancellationReport, CompleteMatch, MatchUpdate, PaginationConfig, RecordResult, ReportResult,
    ValidationDecision,
};
use crate::ports::MatchLifecycleApi;
use async_trait::async_trait;
use mf_01_match_store::{MatchStore, ResultStore, WriteGuard};
use mf_02_match_cache::{CacheBackend, MatchCache};
use mf_05_event_gateway::MatchEventSink;
use shared_types::{
    ErrorKind, Match, MatchError, MatchEvent, MatchFilter, MatchId, MatchPage, MatchPatch,
    MatchResult, NewMatch, NewPlayerResult, PageRequest, PlayerResult, SystemTimeSource,
    TimeSource, TournamentId,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Page size used when sweeping a tournament's matches.
const SWEEP_PAGE_SIZE: u32 = 100;

/// The lifecycle engine.
pub struct LifecycleService<S, R, B, E> {
    store: Arc<S>,
    results: Arc<R>,
    cache: Arc<MatchCache<S, B>>,
    events: Arc<E>,
    pagination: PaginationConfig,
    clock: Arc<dyn TimeSource>,
}

impl<S, R, B, E> LifecycleService<S, R, B, E>
where
    S: MatchStore,
    R: ResultStore,
    B: CacheBackend,
    E: MatchEventSink,
{
    pub fn new(
        store: Arc<S>,
        results: Arc<R>,
        cache: Arc<MatchCache<S, B>>,
        events: Arc<E>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            store,
            results,
            cache,
            events,
            pagination,
            clock: Arc::new(SystemTimeSource),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    async fn load(&self, id: MatchId) -> MatchResult<Match> {
        Ok(self.store.get_by_id(id).await?)
    }

    /// Conditional write, invalidation, event.
    async fn commit(
        &self,
        current: &Match,
        patch: MatchPatch,
        event: fn(Match) -> MatchEvent,
    ) -> MatchResult<Match> {
        let updated = self
            .store
            .conditional_update(current.id, WriteGuard::status(current.status), patch)
            .await
            .map_err(|e| {
                let err = MatchError::from(e);
                if err.kind() == ErrorKind::Conflict {
                    debug!(match_id = %current.id, error = %err, "Lost a concurrent transition");
                }
                err
            })?;

        self.cache.invalidate(updated.id).await;
        let event = event(updated.clone());
        info!(
            match_id = %updated.id,
            tournament_id = updated.tournament_id,
            from = %current.status,
            to = %updated.status,
            event = event.routing_key(),
            "Match transition committed"
        );
        self.events.emit(event).await;
        Ok(updated)
    }

    async fn open_matches(&self, tournament_id: TournamentId) -> MatchResult<Vec<Match>> {
        let filter = MatchFilter::tournament(tournament_id);
        let mut open = Vec::new();
        let mut page = 1;
        loop {
            let (rows, total) = self
                .store
                .list(&filter, PageRequest::new(page, SWEEP_PAGE_SIZE))
                .await?;
            let fetched = rows.len();
            open.extend(rows.into_iter().filter(|m| !m.is_terminal()));
            if fetched == 0 || u64::from(page) * u64::from(SWEEP_PAGE_SIZE) >= total {
                return Ok(open);
            }
            page += 1;
        }
    }
}

#[async_trait]
impl<S, R, B, E> MatchLifecycleApi for LifecycleService<S, R, B, E>
where
    S: MatchStore,
    R: ResultStore,
    B: CacheBackend,
    E: MatchEventSink,
{
    async fn create(&self, new: NewMatch) -> MatchResult<Match> {
        if new.key.round == 0 || new.key.match_number == 0 {
            return Err(MatchError::validation(
                "round and match_number are one-based",
            ));
        }
        if let (Some(a), Some(b)) = (&new.slot_a, &new.slot_b) {
            if a == b {
                return Err(MatchError::validation(format!(
                    "player {a} cannot occupy both slots"
                )));
            }
        }

        let created = self.store.create(new).await?;
        self.cache.invalidate(created.id).await;
        info!(
            match_id = %created.id,
            tournament_id = created.tournament_id,
            round = created.round,
            match_number = created.match_number,
            "Match created"
        );
        self.events.emit(MatchEvent::Created(created.clone())).await;
        Ok(created)
    }

    async fn get(&self, id: MatchId) -> MatchResult<Match> {
        self.cache.get_match(id).await
    }

    async fn list(
        &self,
        filter: MatchFilter,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> MatchResult<MatchPage> {
        let request = self.pagination.resolve(page, page_size);
        self.cache.list_matches(&filter, request).await
    }

    async fn update(&self, id: MatchId, update: MatchUpdate) -> MatchResult<Match> {
        let current = self.load(id).await?;
        let patch = plan_update(&current, &update)?;
        self.commit(&current, patch, MatchEvent::Updated).await
    }

    async fn start(&self, id: MatchId) -> MatchResult<Match> {
        let current = self.load(id).await?;
        let patch = plan_start(&current, self.clock.now())?;
        self.commit(&current, patch, MatchEvent::Started).await
    }

    async fn report_result(&self, id: MatchId, report: ReportResult) -> MatchResult<Match> {
        let current = self.load(id).await?;
        let patch = plan_report(&current, &report)?;
        if let Some(reporter) = &report.reporter_id {
            debug!(match_id = %id, %reporter, "Result reported");
        }
        self.commit(&current, patch, MatchEvent::ResultReported).await
    }

    async fn validate_result(
        &self,
        id: MatchId,
        decision: ValidationDecision,
    ) -> MatchResult<Match> {
        let current = self.load(id).await?;
        match decision {
            ValidationDecision::Accept { winner_override } => {
                let patch = plan_accept(&current, winner_override.as_ref(), self.clock.now())?;
                self.commit(&current, patch, MatchEvent::Finished).await
            }
            ValidationDecision::Reject { reason } => {
                let patch = plan_reject(&current, reason.as_deref())?;
                self.commit(&current, patch, MatchEvent::ResultRejected).await
            }
        }
    }

    async fn complete(&self, id: MatchId, complete: CompleteMatch) -> MatchResult<Match> {
        let current = self.load(id).await?;
        let patch = plan_complete(&current, &complete, self.clock.now())?;
        self.commit(&current, patch, MatchEvent::Completed).await
    }

    async fn cancel(&self, id: MatchId, reason: Option<String>) -> MatchResult<Match> {
        let current = self.load(id).await?;
        let patch = plan_cancel(&current, reason.as_deref())?;
        self.commit(&current, patch, MatchEvent::Cancelled).await
    }

    async fn delete(&self, id: MatchId) -> MatchResult<()> {
        let current = self.load(id).await?;
        check_delete(&current)?;

        let deleted = self.store.soft_delete(id, current.status).await?;
        self.cache.invalidate(id).await;
        info!(match_id = %id, tournament_id = deleted.tournament_id, "Match deleted");
        self.events.emit(MatchEvent::Deleted(deleted)).await;
        Ok(())
    }

    async fn record_player_result(
        &self,
        match_id: MatchId,
        record: RecordResult,
    ) -> MatchResult<PlayerResult> {
        let current = self.load(match_id).await?;
        if current.slot_of(&record.player_id).is_none() {
            return Err(MatchError::validation(format!(
                "player {} is not a participant of match {match_id}",
                record.player_id
            )));
        }
        let stats = match record.stats {
            serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
            stats @ serde_json::Value::Object(_) => stats,
            _ => return Err(MatchError::validation("stats must be a JSON object")),
        };

        let result = self
            .results
            .append(NewPlayerResult {
                match_id,
                player_id: record.player_id,
                score: record.score,
                is_winner: record.is_winner,
                stats,
                notes: record.notes,
            })
            .await?;
        info!(%match_id, player_id = %result.player_id, "Player result recorded");
        self.events.emit(MatchEvent::ResultRecorded(result.clone())).await;
        Ok(result)
    }

    async fn list_player_results(&self, match_id: MatchId) -> MatchResult<Vec<PlayerResult>> {
        self.load(match_id).await?;
        Ok(self.results.list_for_match(match_id).await?)
    }

    async fn cancel_open_matches(
        &self,
        tournament_id: TournamentId,
        reason: Option<String>,
    ) -> MatchResult<CancellationReport> {
        let mut report = CancellationReport::default();
        for current in self.open_matches(tournament_id).await? {
            let patch = plan_cancel(&current, reason.as_deref())?;
            match self.commit(&current, patch, MatchEvent::Cancelled).await {
                Ok(_) => report.cancelled += 1,
                Err(err) if err.kind() == ErrorKind::Conflict || err.kind() == ErrorKind::NotFound => {
                    warn!(match_id = %current.id, error = %err, "Skipping match that changed during cancellation");
                    report.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
        info!(
            tournament_id,
            cancelled = report.cancelled,
            skipped = report.skipped,
            "Cancelled open matches of tournament"
        );
        Ok(report)
    }
}
