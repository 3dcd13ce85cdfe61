//! # Store Ports
//!
//! The contracts the lifecycle engine and the propagation handler write
//! through. Implementations must make every method atomic with respect to
//! the others; callers do no locking of their own.

use crate::domain::{StoreResult, WriteGuard};
use async_trait::async_trait;
use shared_types::{
    Match, MatchFilter, MatchId, MatchKey, MatchPatch, MatchStatus, NewMatch, NewPlayerResult,
    PageRequest, PlayerResult,
};

/// Durable match table.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Fetch a live row by id. Soft-deleted rows are `NotFound`.
    async fn get_by_id(&self, id: MatchId) -> StoreResult<Match>;

    /// Fetch the live row at a bracket position, if any.
    async fn get_by_key(&self, key: &MatchKey) -> StoreResult<Option<Match>>;

    /// Insert a `Scheduled` row with zero scores.
    ///
    /// Fails with `DuplicateKey` when a live row already holds the key.
    async fn create(&self, new: NewMatch) -> StoreResult<Match>;

    /// Apply `patch` only if `guard` still holds for the persisted row.
    ///
    /// Bumps `updated_at` and returns the post-write snapshot.
    async fn conditional_update(
        &self,
        id: MatchId,
        guard: WriteGuard,
        patch: MatchPatch,
    ) -> StoreResult<Match>;

    /// Live rows matching `filter`, ordered by `(round, match_number)`, and
    /// the total count before paging.
    async fn list(&self, filter: &MatchFilter, page: PageRequest) -> StoreResult<(Vec<Match>, u64)>;

    /// Mark a row deleted if it still has `expected` status. Its natural key
    /// becomes free; its id is never reused.
    async fn soft_delete(&self, id: MatchId, expected: MatchStatus) -> StoreResult<Match>;
}

/// Append-only per-player result records.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Append a record. Fails with `DuplicateResult` for a second record of
    /// the same (match, player).
    async fn append(&self, new: NewPlayerResult) -> StoreResult<PlayerResult>;

    /// All records of a match in insertion order.
    async fn list_for_match(&self, match_id: MatchId) -> StoreResult<Vec<PlayerResult>>;
}
