//! # Service Container
//!
//! Builds every subsystem once, injecting shared handles explicitly.
//!
//! ```text
//! InMemoryEventBus ──→ BusEventSink ─────────────┐
//! TimedStore<InMemoryMatchStore> ─┬─→ MatchCache ─┼─→ LifecycleService
//!                                 │               └─→ BracketPropagator
//! TimedStore<InMemoryResultStore> ┘
//! ```

use std::sync::Arc;

use mf_01_match_store::{InMemoryMatchStore, InMemoryResultStore, TimedStore};
use mf_02_match_cache::{InMemoryCache, MatchCache};
use mf_03_lifecycle::LifecycleService;
use mf_04_bracket_propagation::BracketPropagator;
use mf_05_event_gateway::{BusEventSink, FailureLedger};
use shared_bus::{InMemoryEventBus, QueueSpec, DLQ_TOPIC};
use tracing::info;

use crate::container::config::RuntimeConfig;
use crate::handlers::InboundRouter;

pub type ConcreteStore = TimedStore<InMemoryMatchStore>;
pub type ConcreteResultStore = TimedStore<InMemoryResultStore>;
pub type ConcreteCache = MatchCache<ConcreteStore, InMemoryCache>;
pub type ConcreteSink = BusEventSink<InMemoryEventBus>;
pub type ConcreteLifecycle =
    LifecycleService<ConcreteStore, ConcreteResultStore, InMemoryCache, ConcreteSink>;
pub type ConcretePropagator = BracketPropagator<ConcreteStore, InMemoryCache, ConcreteSink>;
pub type ConcreteRouter = InboundRouter<ConcreteLifecycle, ConcretePropagator>;

/// Every subsystem instance of one service process.
pub struct ServiceContainer {
    pub config: RuntimeConfig,
    pub bus: Arc<InMemoryEventBus>,
    pub store: Arc<ConcreteStore>,
    pub results: Arc<ConcreteResultStore>,
    pub cache_backend: Arc<InMemoryCache>,
    pub cache: Arc<ConcreteCache>,
    pub events: Arc<ConcreteSink>,
    pub lifecycle: Arc<ConcreteLifecycle>,
    pub propagator: Arc<ConcretePropagator>,
    pub router: Arc<ConcreteRouter>,
    pub ledger: Arc<FailureLedger>,
}

impl ServiceContainer {
    pub fn new(config: RuntimeConfig) -> Self {
        let bus = Arc::new(
            InMemoryEventBus::with_capacity(config.bus.channel_capacity)
                .with_exchange(config.bus.exchange.clone()),
        );
        Self::with_bus(config, bus)
    }

    /// Wire the subsystems onto an existing bus.
    pub fn with_bus(config: RuntimeConfig, bus: Arc<InMemoryEventBus>) -> Self {
        let store = Arc::new(TimedStore::new(
            InMemoryMatchStore::new(),
            config.store.op_timeout,
        ));
        let results = Arc::new(TimedStore::new(
            InMemoryResultStore::new(),
            config.store.op_timeout,
        ));
        let cache_backend = Arc::new(InMemoryCache::new());
        let cache = Arc::new(MatchCache::new(
            store.clone(),
            cache_backend.clone(),
            config.cache.clone(),
        ));
        let events = Arc::new(BusEventSink::new(bus.clone()));

        let lifecycle = Arc::new(LifecycleService::new(
            store.clone(),
            results.clone(),
            cache.clone(),
            events.clone(),
            config.pagination,
        ));
        let propagator = Arc::new(BracketPropagator::new(
            store.clone(),
            cache.clone(),
            events.clone(),
        ));
        let router = Arc::new(InboundRouter::new(lifecycle.clone(), propagator.clone()));
        let ledger = Arc::new(FailureLedger::new(config.bus.failure_ledger_capacity));
        bus.declare_queue(QueueSpec::new(
            config.bus.dead_letter_queue.clone(),
            [DLQ_TOPIC],
        ));

        info!(
            exchange = bus.exchange(),
            dead_letter_queue = %config.bus.dead_letter_queue,
            cache_enabled = config.cache.enabled,
            store_timeout_ms = config.store.op_timeout.as_millis() as u64,
            "Service container initialized"
        );

        Self {
            config,
            bus,
            store,
            results,
            cache_backend,
            cache,
            events,
            lifecycle,
            propagator,
            router,
            ledger,
        }
    }
}
