//! # Outbound Ports
//!
//! Key/value cache capability. Absence of a key is not an error.

use crate::domain::CacheError;
use async_trait::async_trait;
use std::time::Duration;

/// String key/value cache with per-entry TTL.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every key starting with `prefix`; returns how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError>;
}
