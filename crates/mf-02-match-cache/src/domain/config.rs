//! Cache configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default TTL for cached entries (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default bound on a single backend call.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_millis(250);

/// Read-through cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When false every read goes to the store.
    pub enabled: bool,
    pub match_ttl: Duration,
    pub list_ttl: Duration,
    /// Bound on each backend call; expiry degrades to the store.
    pub op_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            match_ttl: DEFAULT_TTL,
            list_ttl: DEFAULT_TTL,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }
}

impl CacheConfig {
    /// Short timings for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            enabled: true,
            match_ttl: Duration::from_secs(60),
            list_ttl: Duration::from_secs(60),
            op_timeout: Duration::from_millis(50),
        }
    }
}
