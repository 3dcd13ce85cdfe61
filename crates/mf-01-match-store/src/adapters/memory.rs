//! In-memory store adapters.
//!
//! Each method takes the table lock once, so the guard check and the write
//! of `conditional_update` are a single atomic step, like a
//! `UPDATE ... WHERE status = $expected` in a relational store.

use crate::domain::{StoreError, StoreResult, WriteGuard};
use crate::ports::{MatchStore, ResultStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shared_types::{
    Match, MatchFilter, MatchId, MatchKey, MatchPatch, MatchStatus, NewMatch, NewPlayerResult,
    PageRequest, PlayerResult, SystemTimeSource, TimeSource,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

struct Row {
    record: Match,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Table {
    rows: HashMap<MatchId, Row>,
    /// Natural key index over live rows only.
    by_key: HashMap<MatchKey, MatchId>,
}

/// Shared fault switches for the in-memory adapters.
#[derive(Default)]
struct Faults {
    unavailable: AtomicBool,
    latency: RwLock<Option<Duration>>,
}

impl Faults {
    async fn enter(&self) -> StoreResult<()> {
        let latency = *self.latency.read();
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

/// In-memory match table.
pub struct InMemoryMatchStore {
    table: RwLock<Table>,
    faults: Faults,
    clock: Arc<dyn TimeSource>,
}

impl InMemoryMatchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemTimeSource))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            faults: Faults::default(),
            clock,
        }
    }

    /// Simulate the database going away or coming back.
    pub fn set_available(&self, available: bool) {
        self.faults.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.faults.latency.write() = latency;
    }

    /// Number of live rows.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.table.read().by_key.len()
    }
}

impl Default for InMemoryMatchStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn get_by_id(&self, id: MatchId) -> StoreResult<Match> {
        self.faults.enter().await?;
        let table = self.table.read();
        table
            .rows
            .get(&id)
            .filter(|row| row.deleted_at.is_none())
            .map(|row| row.record.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn get_by_key(&self, key: &MatchKey) -> StoreResult<Option<Match>> {
        self.faults.enter().await?;
        let table = self.table.read();
        Ok(table
            .by_key
            .get(key)
            .and_then(|id| table.rows.get(id))
            .map(|row| row.record.clone()))
    }

    async fn create(&self, new: NewMatch) -> StoreResult<Match> {
        self.faults.enter().await?;
        let now = self.clock.now();
        let mut table = self.table.write();
        if table.by_key.contains_key(&new.key) {
            return Err(StoreError::DuplicateKey(new.key));
        }

        let record = Match {
            id: MatchId::new(),
            tournament_id: new.key.tournament_id,
            round: new.key.round,
            match_number: new.key.match_number,
            slot_a: new.slot_a,
            slot_b: new.slot_b,
            winner: None,
            player1_score: 0,
            player2_score: 0,
            status: MatchStatus::Scheduled,
            scheduled_at: new.scheduled_at,
            started_at: None,
            completed_at: None,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        table.by_key.insert(new.key, record.id);
        table.rows.insert(
            record.id,
            Row {
                record: record.clone(),
                deleted_at: None,
            },
        );
        debug!(match_id = %record.id, key = %new.key, "Inserted match row");
        Ok(record)
    }

    async fn conditional_update(
        &self,
        id: MatchId,
        guard: WriteGuard,
        patch: MatchPatch,
    ) -> StoreResult<Match> {
        self.faults.enter().await?;
        let now = self.clock.now();
        let mut table = self.table.write();
        let row = table
            .rows
            .get_mut(&id)
            .filter(|row| row.deleted_at.is_none())
            .ok_or(StoreError::NotFound(id))?;

        if row.record.status != guard.expected_status {
            return Err(StoreError::StatusConflict {
                id,
                expected: guard.expected_status,
                actual: row.record.status,
            });
        }
        if !guard.admits(&row.record) {
            if let Some(slot) = guard.vacant_slot {
                return Err(StoreError::SlotOccupied { id, slot });
            }
        }

        patch.apply_to(&mut row.record);
        row.record.updated_at = now;
        Ok(row.record.clone())
    }

    async fn list(&self, filter: &MatchFilter, page: PageRequest) -> StoreResult<(Vec<Match>, u64)> {
        self.faults.enter().await?;
        let table = self.table.read();
        let mut live: Vec<&Match> = table
            .rows
            .values()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| &row.record)
            .filter(|record| filter.matches(record))
            .collect();
        live.sort_by_key(|m| (m.round, m.match_number, m.tournament_id, m.created_at));

        let total = live.len() as u64;
        let matches = live
            .into_iter()
            .skip(page.offset())
            .take(page.page_size as usize)
            .cloned()
            .collect();
        Ok((matches, total))
    }

    async fn soft_delete(&self, id: MatchId, expected: MatchStatus) -> StoreResult<Match> {
        self.faults.enter().await?;
        let now = self.clock.now();
        let mut table = self.table.write();
        let row = table
            .rows
            .get_mut(&id)
            .filter(|row| row.deleted_at.is_none())
            .ok_or(StoreError::NotFound(id))?;
        if row.record.status != expected {
            return Err(StoreError::StatusConflict {
                id,
                expected,
                actual: row.record.status,
            });
        }

        row.deleted_at = Some(now);
        row.record.updated_at = now;
        let record = row.record.clone();
        table.by_key.remove(&record.key());
        debug!(match_id = %id, "Soft-deleted match row");
        Ok(record)
    }
}

/// In-memory result table.
pub struct InMemoryResultStore {
    results: RwLock<Vec<PlayerResult>>,
    faults: Faults,
    clock: Arc<dyn TimeSource>,
}

impl InMemoryResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            results: RwLock::new(Vec::new()),
            faults: Faults::default(),
            clock: Arc::new(SystemTimeSource),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.faults.unavailable.store(!available, Ordering::SeqCst);
    }
}

impl Default for InMemoryResultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn append(&self, new: NewPlayerResult) -> StoreResult<PlayerResult> {
        self.faults.enter().await?;
        let mut results = self.results.write();
        if results
            .iter()
            .any(|r| r.match_id == new.match_id && r.player_id == new.player_id)
        {
            return Err(StoreError::DuplicateResult {
                match_id: new.match_id,
                player: new.player_id,
            });
        }

        let result = PlayerResult {
            id: Uuid::new_v4(),
            match_id: new.match_id,
            player_id: new.player_id,
            score: new.score,
            is_winner: new.is_winner,
            stats: new.stats,
            notes: new.notes,
            created_at: self.clock.now(),
        };
        results.push(result.clone());
        Ok(result)
    }

    async fn list_for_match(&self, match_id: MatchId) -> StoreResult<Vec<PlayerResult>> {
        self.faults.enter().await?;
        Ok(self
            .results
            .read()
            .iter()
            .filter(|r| r.match_id == match_id)
            .cloned()
            .collect())
    }
}
