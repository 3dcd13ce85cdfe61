//! Shared fixtures for the integration flows.

use std::sync::Arc;
use std::time::Duration;

use match_runtime::{MatchRuntime, RuntimeConfig, ServiceContainer};
use mf_01_match_store::MatchStore;
use mf_02_match_cache::CacheConfig;
use shared_bus::{EventEnvelope, EventFilter, EventPublisher, Subscription};
use shared_types::{Match, MatchKey, NewMatch, PlayerId};

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const POLL_ATTEMPTS: usize = 400;

/// Config tuned for fast tests: short backoff, small redelivery limit.
pub fn test_config() -> RuntimeConfig {
    let mut config = RuntimeConfig {
        cache: CacheConfig::for_testing(),
        ..RuntimeConfig::default()
    };
    config.store.op_timeout = Duration::from_secs(1);
    config.bus.nack_backoff = Duration::from_millis(1);
    config.bus.max_deliveries = Some(3);
    config
}

/// A started runtime plus an observer on every outbound match event.
pub struct Harness {
    pub runtime: MatchRuntime,
    pub container: Arc<ServiceContainer>,
    pub outbound: Subscription,
}

impl Harness {
    pub fn start() -> Self {
        Self::start_with(test_config())
    }

    pub fn start_with(config: RuntimeConfig) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init();

        let runtime = MatchRuntime::new(config).expect("test config is valid");
        let container = runtime.container();
        let outbound = container.bus.subscribe(EventFilter::topics(["match.#"]));
        runtime.start();
        Self {
            runtime,
            container,
            outbound,
        }
    }

    /// Publish an inbound event onto the tournament exchange.
    pub async fn publish(&self, routing_key: &str, event_type: &str, data: serde_json::Value) {
        let routed = self
            .container
            .bus
            .publish(EventEnvelope::new(routing_key, event_type, data))
            .await
            .expect("bus accepts publish");
        assert_eq!(routed, 1, "inbound event should reach the service queue");
    }

    /// Wait until the consumer has acknowledged `n` deliveries in total.
    pub async fn acked(&self, n: u64) {
        eventually(&format!("{n} acked deliveries"), || {
            self.runtime.consumer_stats().acked >= n
        })
        .await;
    }

    /// Routing keys of outbound events observed since the last call.
    pub fn outbound_keys(&mut self) -> Vec<String> {
        self.outbound
            .drain()
            .into_iter()
            .map(|e| e.routing_key)
            .collect()
    }

    pub async fn by_key(&self, key: MatchKey) -> Option<Match> {
        self.container
            .store
            .get_by_key(&key)
            .await
            .expect("store reachable")
    }
}

/// Poll a condition until it holds or the attempt budget runs out.
pub async fn eventually<F: Fn() -> bool>(what: &str, check: F) {
    for _ in 0..POLL_ATTEMPTS {
        if check() {
            return;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    panic!("timed out waiting for {what}");
}

pub fn seeded(tournament: u64, round: u32, number: u32, a: &str, b: &str) -> NewMatch {
    NewMatch {
        key: MatchKey::new(tournament, round, number),
        slot_a: Some(PlayerId::from(a)),
        slot_b: Some(PlayerId::from(b)),
        ..NewMatch::default()
    }
}
