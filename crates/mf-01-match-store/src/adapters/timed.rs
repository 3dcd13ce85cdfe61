//! Timeout decorator for store ports.
//!
//! Every call is bounded; an expired call surfaces as
//! [`StoreError::Timeout`], which the taxonomy maps to a transient error.

use crate::domain::{StoreError, StoreResult, WriteGuard};
use crate::ports::{MatchStore, ResultStore};
use async_trait::async_trait;
use shared_types::{
    Match, MatchFilter, MatchId, MatchKey, MatchPatch, MatchStatus, NewMatch, NewPlayerResult,
    PageRequest, PlayerResult,
};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Wraps a store so every operation runs under `timeout`.
pub struct TimedStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimedStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = StoreResult<T>> + Send,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "Store call timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl<S: MatchStore> MatchStore for TimedStore<S> {
    async fn get_by_id(&self, id: MatchId) -> StoreResult<Match> {
        self.bounded("get_by_id", self.inner.get_by_id(id)).await
    }

    async fn get_by_key(&self, key: &MatchKey) -> StoreResult<Option<Match>> {
        self.bounded("get_by_key", self.inner.get_by_key(key)).await
    }

    async fn create(&self, new: NewMatch) -> StoreResult<Match> {
        self.bounded("create", self.inner.create(new)).await
    }

    async fn conditional_update(
        &self,
        id: MatchId,
        guard: WriteGuard,
        patch: MatchPatch,
    ) -> StoreResult<Match> {
        self.bounded(
            "conditional_update",
            self.inner.conditional_update(id, guard, patch),
        )
        .await
    }

    async fn list(&self, filter: &MatchFilter, page: PageRequest) -> StoreResult<(Vec<Match>, u64)> {
        self.bounded("list", self.inner.list(filter, page)).await
    }

    async fn soft_delete(&self, id: MatchId, expected: MatchStatus) -> StoreResult<Match> {
        self.bounded("soft_delete", self.inner.soft_delete(id, expected))
            .await
    }
}

#[async_trait]
impl<S: ResultStore> ResultStore for TimedStore<S> {
    async fn append(&self, new: NewPlayerResult) -> StoreResult<PlayerResult> {
        self.bounded("append_result", self.inner.append(new)).await
    }

    async fn list_for_match(&self, match_id: MatchId) -> StoreResult<Vec<PlayerResult>> {
        self.bounded("list_results", self.inner.list_for_match(match_id))
            .await
    }
}
