//! # Read-Through Match Cache
//!
//! ```text
//! get_match(id) ──→ backend.get("match:{id}") ──hit──→ snapshot
//!                         │ miss / error / timeout
//!                         ▼
//!                   store.get_by_id(id) ──→ backend.set(.., ttl) ──→ snapshot
//! ```
//!
//! Backend failures are logged and swallowed; the store answers instead.
//! A load that overlapped an invalidation is returned to its caller but
//! not written back, so it cannot resurrect a snapshot that an invalidation
//! already removed.

use crate::domain::{list_key, match_key, CacheConfig, CacheError, LIST_PREFIX};
use crate::ports::CacheBackend;
use mf_01_match_store::MatchStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{Match, MatchFilter, MatchId, MatchPage, MatchResult, PageRequest};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Hit / miss / degraded counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Backend calls that failed or timed out.
    pub degraded: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    degraded: AtomicU64,
}

/// Read-through cache in front of a [`MatchStore`].
pub struct MatchCache<S, B> {
    store: Arc<S>,
    backend: Arc<B>,
    config: CacheConfig,
    /// Bumped by every single-match invalidation.
    match_epoch: AtomicU64,
    /// Bumped by every list invalidation.
    list_epoch: AtomicU64,
    counters: Counters,
}

impl<S: MatchStore, B: CacheBackend> MatchCache<S, B> {
    pub fn new(store: Arc<S>, backend: Arc<B>, config: CacheConfig) -> Self {
        Self {
            store,
            backend,
            config,
            match_epoch: AtomicU64::new(0),
            list_epoch: AtomicU64::new(0),
            counters: Counters::default(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            degraded: self.counters.degraded.load(Ordering::Relaxed),
        }
    }

    /// Cached snapshot of a live match, loading from the store on miss.
    pub async fn get_match(&self, id: MatchId) -> MatchResult<Match> {
        let key = match_key(id);
        if let Some(hit) = self.lookup::<Match>(&key).await {
            return Ok(hit);
        }

        let epoch = self.match_epoch.load(Ordering::SeqCst);
        let record = self.store.get_by_id(id).await?;
        self.fill(&key, &record, self.config.match_ttl, &self.match_epoch, epoch)
            .await;
        Ok(record)
    }

    /// Cached list page, loading from the store on miss.
    pub async fn list_matches(
        &self,
        filter: &MatchFilter,
        page: PageRequest,
    ) -> MatchResult<MatchPage> {
        let key = list_key(filter, page);
        if let Some(hit) = self.lookup::<MatchPage>(&key).await {
            return Ok(hit);
        }

        let epoch = self.list_epoch.load(Ordering::SeqCst);
        let (matches, total) = self.store.list(filter, page).await?;
        let result = MatchPage::new(matches, total, page);
        self.fill(&key, &result, self.config.list_ttl, &self.list_epoch, epoch)
            .await;
        Ok(result)
    }

    /// Drop the cached snapshot of one match.
    pub async fn invalidate_match(&self, id: MatchId) {
        self.match_epoch.fetch_add(1, Ordering::SeqCst);
        if !self.config.enabled {
            return;
        }
        let key = match_key(id);
        if let Err(err) = self.bounded(self.backend.delete(&key)).await {
            self.degraded("delete", &key, &err);
        }
    }

    /// Drop every cached list page.
    pub async fn invalidate_lists(&self) {
        self.list_epoch.fetch_add(1, Ordering::SeqCst);
        if !self.config.enabled {
            return;
        }
        match self.bounded(self.backend.delete_prefix(LIST_PREFIX)).await {
            Ok(removed) => debug!(removed, "Invalidated list pages"),
            Err(err) => self.degraded("delete_prefix", LIST_PREFIX, &err),
        }
    }

    /// Invalidation required after every successful mutation of `id`.
    pub async fn invalidate(&self, id: MatchId) {
        self.invalidate_match(id).await;
        self.invalidate_lists().await;
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.config.enabled {
            return None;
        }
        match self.bounded(self.backend.get(key)).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    self.degraded("decode", key, &CacheError::Corrupt(e.to_string()));
                    let _ = self.bounded(self.backend.delete(key)).await;
                    None
                }
            },
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(err) => {
                self.degraded("get", key, &err);
                None
            }
        }
    }

    async fn fill<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        epoch: &AtomicU64,
        seen: u64,
    ) {
        if !self.config.enabled || epoch.load(Ordering::SeqCst) != seen {
            return;
        }
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode cache entry");
                return;
            }
        };
        if let Err(err) = self.bounded(self.backend.set(key, raw, ttl)).await {
            self.degraded("set", key, &err);
            return;
        }
        // An invalidation may have slipped in between the check and the set.
        if epoch.load(Ordering::SeqCst) != seen {
            let _ = self.bounded(self.backend.delete(key)).await;
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.config.op_timeout, fut)
            .await
            .unwrap_or(Err(CacheError::Timeout(self.config.op_timeout)))
    }

    fn degraded(&self, operation: &str, key: &str, err: &CacheError) {
        self.counters.degraded.fetch_add(1, Ordering::Relaxed);
        warn!(operation, key, error = %err, "Cache degraded, falling back to store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryCache;
    use mf_01_match_store::{InMemoryMatchStore, WriteGuard};
    use shared_types::{MatchKey, MatchPatch, MatchStatus, NewMatch, PlayerId};

    type Cache = MatchCache<InMemoryMatchStore, InMemoryCache>;

    fn setup() -> (Arc<InMemoryMatchStore>, Arc<InMemoryCache>, Cache) {
        let store = Arc::new(InMemoryMatchStore::new());
        let backend = Arc::new(InMemoryCache::new());
        let cache = MatchCache::new(store.clone(), backend.clone(), CacheConfig::for_testing());
        (store, backend, cache)
    }

    async fn seed(store: &InMemoryMatchStore) -> Match {
        store
            .create(NewMatch {
                key: MatchKey::new(1, 1, 1),
                slot_a: Some(PlayerId::from("p1")),
                slot_b: Some(PlayerId::from("p2")),
                ..NewMatch::default()
            })
            .await
            .unwrap()
    }

    async fn start(store: &InMemoryMatchStore, id: MatchId) -> Match {
        store
            .conditional_update(
                id,
                WriteGuard::status(MatchStatus::Scheduled),
                MatchPatch {
                    status: Some(MatchStatus::InProgress),
                    ..MatchPatch::default()
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_read_through_then_hit() {
        let (store, backend, cache) = setup();
        let m = seed(&store).await;

        assert_eq!(cache.get_match(m.id).await.unwrap(), m);
        assert!(backend.contains(&match_key(m.id)));
        assert_eq!(cache.get_match(m.id).await.unwrap(), m);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_stale_until_invalidated() {
        let (store, _backend, cache) = setup();
        let m = seed(&store).await;
        cache.get_match(m.id).await.unwrap();

        start(&store, m.id).await;
        assert_eq!(
            cache.get_match(m.id).await.unwrap().status,
            MatchStatus::Scheduled,
            "within TTL and before invalidation, staleness is accepted"
        );

        cache.invalidate(m.id).await;
        assert_eq!(
            cache.get_match(m.id).await.unwrap().status,
            MatchStatus::InProgress
        );
    }

    #[tokio::test]
    async fn test_list_pages_cached_and_invalidated() {
        let (store, backend, cache) = setup();
        seed(&store).await;
        let filter = MatchFilter::tournament(1);

        let page = cache.list_matches(&filter, PageRequest::new(1, 10)).await.unwrap();
        assert_eq!(page.total, 1);
        assert!(backend.contains("matches:list:1:all:1:10"));

        cache.invalidate_lists().await;
        assert!(!backend.contains("matches:list:1:all:1:10"));
    }

    #[tokio::test]
    async fn test_unavailable_backend_degrades_to_store() {
        let (store, backend, cache) = setup();
        let m = seed(&store).await;
        backend.set_available(false);

        assert_eq!(cache.get_match(m.id).await.unwrap(), m);
        cache.invalidate(m.id).await;
        assert!(cache.stats().degraded >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_degrades_to_store() {
        let (store, backend, cache) = setup();
        let m = seed(&store).await;
        backend.set_latency(Some(Duration::from_secs(10)));

        assert_eq!(cache.get_match(m.id).await.unwrap(), m);
        assert!(cache.stats().degraded >= 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let (_store, backend, cache) = setup();
        let id = MatchId::new();
        assert!(cache.get_match(id).await.is_err());
        assert!(!backend.contains(&match_key(id)));
    }

    #[tokio::test]
    async fn test_disabled_cache_reads_store() {
        let store = Arc::new(InMemoryMatchStore::new());
        let backend = Arc::new(InMemoryCache::new());
        let cache = MatchCache::new(
            store.clone(),
            backend.clone(),
            CacheConfig {
                enabled: false,
                ..CacheConfig::default()
            },
        );
        let m = seed(&store).await;
        cache.get_match(m.id).await.unwrap();
        assert!(backend.is_empty());
    }
}
