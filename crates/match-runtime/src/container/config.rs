//! # Runtime Configuration
//!
//! Unified configuration for the store, cache, bus and pagination layers.
//!
//! Every section has a `Default`. [`RuntimeConfig::from_env`] overrides from
//! `MATCHES_*` environment variables; unparseable values are logged and
//! ignored so a typo never prevents startup.

use mf_02_match_cache::CacheConfig;
use mf_03_lifecycle::PaginationConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Default log filter when neither `RUST_LOG` nor `MATCHES_LOG_LEVEL` is set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Queue that holds messages moved to the dead-letter topic.
pub const DEAD_LETTER_QUEUE: &str = "matches_dead_letter_queue";

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub bus: BusConfig,
    pub pagination: PaginationConfig,
    /// `EnvFilter` directive used by the binary.
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            cache: CacheConfig::default(),
            bus: BusConfig::default(),
            pagination: PaginationConfig::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Match store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Bound on each store call; expiry surfaces as a transient error.
    pub op_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_secs(5),
        }
    }
}

/// Message bus settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    pub exchange: String,
    pub queue: String,
    /// Durable queue bound to the dead-letter topic.
    pub dead_letter_queue: String,
    /// Unacknowledged deliveries in flight per consumer.
    pub prefetch: usize,
    /// Deliveries before a message is dead-lettered. `None` requeues forever.
    pub max_deliveries: Option<u32>,
    pub nack_backoff: Duration,
    /// Observer channel capacity.
    pub channel_capacity: usize,
    /// Recorded failures kept for remediation.
    pub failure_ledger_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            exchange: shared_bus::DEFAULT_EXCHANGE.to_string(),
            queue: mf_05_event_gateway::INBOUND_QUEUE.to_string(),
            dead_letter_queue: DEAD_LETTER_QUEUE.to_string(),
            prefetch: 1,
            max_deliveries: Some(10),
            nack_backoff: Duration::from_millis(200),
            channel_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
            failure_ledger_capacity: mf_05_event_gateway::FailureLedger::DEFAULT_CAPACITY,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("default page size {default} exceeds max page size {max}")]
    PageSize { default: u32, max: u32 },

    #[error("invalid log filter: {0}")]
    LogFilter(String),
}

impl RuntimeConfig {
    /// Defaults overridden from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let env = Overrides { lookup };

        env.millis("MATCHES_STORE_TIMEOUT_MS", &mut config.store.op_timeout);

        env.parse("MATCHES_CACHE_ENABLED", &mut config.cache.enabled);
        env.secs("MATCHES_CACHE_TTL_SECS", &mut config.cache.match_ttl);
        env.secs("MATCHES_CACHE_LIST_TTL_SECS", &mut config.cache.list_ttl);
        env.millis("MATCHES_CACHE_TIMEOUT_MS", &mut config.cache.op_timeout);

        env.string("MATCHES_EXCHANGE", &mut config.bus.exchange);
        env.string("MATCHES_QUEUE", &mut config.bus.queue);
        env.string("MATCHES_DLQ_QUEUE", &mut config.bus.dead_letter_queue);
        env.parse("MATCHES_PREFETCH", &mut config.bus.prefetch);
        let mut max_deliveries = config.bus.max_deliveries.unwrap_or(0);
        env.parse("MATCHES_MAX_DELIVERIES", &mut max_deliveries);
        config.bus.max_deliveries = (max_deliveries > 0).then_some(max_deliveries);
        env.millis("MATCHES_NACK_BACKOFF_MS", &mut config.bus.nack_backoff);

        env.parse(
            "MATCHES_DEFAULT_PAGE_SIZE",
            &mut config.pagination.default_page_size,
        );
        env.parse("MATCHES_MAX_PAGE_SIZE", &mut config.pagination.max_page_size);

        env.string("MATCHES_LOG_LEVEL", &mut config.log_level);
        config
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.op_timeout.is_zero() {
            return Err(ConfigError::Zero("store timeout"));
        }
        if self.cache.op_timeout.is_zero() {
            return Err(ConfigError::Zero("cache timeout"));
        }
        if self.cache.match_ttl.is_zero() || self.cache.list_ttl.is_zero() {
            return Err(ConfigError::Zero("cache ttl"));
        }
        if self.bus.prefetch == 0 {
            return Err(ConfigError::Zero("prefetch"));
        }
        if self.bus.channel_capacity == 0 {
            return Err(ConfigError::Zero("channel capacity"));
        }
        if self.bus.exchange.trim().is_empty() {
            return Err(ConfigError::Empty("exchange"));
        }
        if self.bus.queue.trim().is_empty() {
            return Err(ConfigError::Empty("queue"));
        }
        if self.bus.dead_letter_queue.trim().is_empty() {
            return Err(ConfigError::Empty("dead-letter queue"));
        }
        if self.pagination.max_page_size == 0 {
            return Err(ConfigError::Zero("max page size"));
        }
        if self.pagination.default_page_size > self.pagination.max_page_size {
            return Err(ConfigError::PageSize {
                default: self.pagination.default_page_size,
                max: self.pagination.max_page_size,
            });
        }
        EnvFilter::try_new(&self.log_level).map_err(|e| ConfigError::LogFilter(e.to_string()))?;
        Ok(())
    }

    /// Filter for the log subscriber. `RUST_LOG` wins over `log_level`.
    pub fn log_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_level))
            .map_err(|e| ConfigError::LogFilter(e.to_string()))
    }
}

struct Overrides<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Overrides<F> {
    fn string(&self, key: &str, target: &mut String) {
        if let Some(value) = (self.lookup)(key) {
            *target = value;
        }
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, target: &mut T) {
        let Some(raw) = (self.lookup)(key) else {
            return;
        };
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => warn!(key, value = %raw, "Ignoring unparseable configuration value"),
        }
    }

    fn millis(&self, key: &str, target: &mut Duration) {
        let mut ms = target.as_millis() as u64;
        self.parse(key, &mut ms);
        *target = Duration::from_millis(ms);
    }

    fn secs(&self, key: &str, target: &mut Duration) {
        let mut secs = target.as_secs();
        self.parse(key, &mut secs);
        *target = Duration::from_secs(secs);
    }
}
