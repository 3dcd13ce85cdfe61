//! Process lifecycle: bind the inbound queue, run the consumer, shut down.

use std::sync::Arc;
use std::time::Duration;

use mf_05_event_gateway::{ConsumerConfig, ConsumerStats, EventConsumer, INBOUND_BINDINGS};
use parking_lot::Mutex;
use shared_bus::QueueSpec;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::services::ConcreteRouter;
use crate::container::{ConfigError, RuntimeConfig, ServiceContainer};

/// Upper bound on waiting for the consumer to settle its in-flight delivery.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The running match service.
pub struct MatchRuntime {
    container: Arc<ServiceContainer>,
    consumer: Arc<EventConsumer<ConcreteRouter>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MatchRuntime {
    /// Validate configuration and build every subsystem.
    pub fn new(config: RuntimeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_container(ServiceContainer::new(config)))
    }

    pub fn from_container(container: ServiceContainer) -> Self {
        let consumer = Arc::new(EventConsumer::new(
            container.router.clone(),
            container.ledger.clone(),
            ConsumerConfig {
                nack_backoff: container.config.bus.nack_backoff,
            },
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            consumer,
            shutdown_tx,
            shutdown_rx,
            worker: Mutex::new(None),
        }
    }

    /// Bind the inbound queue and spawn the consumer worker. Idempotent.
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            warn!("Runtime already started");
            return;
        }

        let bus = &self.container.config.bus;
        let spec = QueueSpec::new(bus.queue.clone(), INBOUND_BINDINGS)
            .with_prefetch(bus.prefetch)
            .with_max_deliveries(bus.max_deliveries);
        let queue = self.container.bus.bind_queue(spec);

        info!(
            exchange = %bus.exchange,
            queue = %bus.queue,
            prefetch = bus.prefetch,
            max_deliveries = ?bus.max_deliveries,
            "Starting match service"
        );

        let consumer = self.consumer.clone();
        let shutdown = self.shutdown_rx.clone();
        *worker = Some(tokio::spawn(async move {
            consumer.run(queue, shutdown).await;
        }));
    }

    /// Signal the worker, wait for the in-flight delivery, close the bus.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, "Consumer task failed"),
                Err(_) => warn!("Consumer did not stop within the grace period"),
            }
        }

        self.container.bus.close();
        let stats = self.consumer.stats();
        info!(
            processed = stats.processed,
            acked = stats.acked,
            requeued = stats.requeued,
            recorded = stats.recorded,
            "Shutdown complete"
        );
    }

    pub fn container(&self) -> Arc<ServiceContainer> {
        Arc::clone(&self.container)
    }

    #[must_use]
    pub fn consumer_stats(&self) -> ConsumerStats {
        self.consumer.stats()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
