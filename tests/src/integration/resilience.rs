//! # Resilience
//!
//! Store outages on the event path requeue the delivery; a bounded number of
//! deliveries moves a persistently failing message to the dead-letter topic,
//! where the service's dead-letter queue holds it.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use match_runtime::container::config::DEAD_LETTER_QUEUE;
    use mf_03_lifecycle::MatchLifecycleApi;
    use serde_json::json;
    use shared_bus::{EventFilter, DLQ_TOPIC};
    use shared_types::{routing, ErrorKind, MatchKey, PlayerId};

    use crate::integration::fixtures::{eventually, seeded, test_config, Harness};

    fn advance() -> serde_json::Value {
        json!({
            "tournament_id": 1,
            "round": 2,
            "match_number": 1,
            "winner_id": "P1",
            "target_slot": "A",
        })
    }

    #[tokio::test]
    async fn test_store_outage_requeues_until_recovery() {
        let mut config = test_config();
        config.bus.max_deliveries = None;
        config.bus.nack_backoff = Duration::from_millis(5);
        let h = Harness::start_with(config);

        h.container.store.inner().set_available(false);
        h.publish(routing::BRACKET_NEXT_MATCH, "BRACKET_UPDATE_NEXT_MATCH", advance())
            .await;
        eventually("a requeued delivery", || {
            h.runtime.consumer_stats().requeued >= 2
        })
        .await;
        assert!(h.container.ledger.is_empty());

        h.container.store.inner().set_available(true);
        h.acked(1).await;

        let row = h.by_key(MatchKey::new(1, 2, 1)).await.unwrap();
        assert_eq!(row.slot_a, Some(PlayerId::from("P1")));
        assert_eq!(h.container.bus.dead_letter_count(), 0);
    }

    #[tokio::test]
    async fn test_persistent_failure_is_dead_lettered() {
        let h = Harness::start();
        let mut dlq = h.container.bus.subscribe(EventFilter::topics([DLQ_TOPIC]));

        h.container.store.inner().set_available(false);
        h.publish(routing::BRACKET_NEXT_MATCH, "BRACKET_UPDATE_NEXT_MATCH", advance())
            .await;

        let dead = tokio::time::timeout(Duration::from_secs(2), dlq.recv())
            .await
            .expect("dead letter within deadline")
            .expect("bus still open");
        assert_eq!(dead.routing_key, DLQ_TOPIC);
        assert_eq!(dead.data["deliveries"], 3);
        assert_eq!(
            dead.data["original"]["routing_key"],
            routing::BRACKET_NEXT_MATCH
        );

        assert_eq!(h.container.bus.dead_letter_count(), 1);
        assert_eq!(h.runtime.consumer_stats().acked, 0);
        eventually("empty inbound queue", || {
            h.container.bus.queue_depth(mf_05_event_gateway::INBOUND_QUEUE) == 0
        })
        .await;
    }

    #[tokio::test]
    async fn test_dead_letter_held_in_declared_queue() {
        let h = Harness::start();
        assert_eq!(h.container.bus.subscriber_count(), 1);

        h.container.store.inner().set_available(false);
        h.publish(routing::BRACKET_NEXT_MATCH, "BRACKET_UPDATE_NEXT_MATCH", advance())
            .await;

        let dlq = h.container.config.bus.dead_letter_queue.clone();
        eventually("a dead letter parked for remediation", || {
            h.container.bus.queue_depth(&dlq) == 1
        })
        .await;
        assert_eq!(dlq, DEAD_LETTER_QUEUE);
        assert_eq!(h.container.bus.dead_letter_count(), 1);
        assert_eq!(h.container.bus.queue_depth(mf_05_event_gateway::INBOUND_QUEUE), 0);
    }

    #[tokio::test]
    async fn test_store_timeout_surfaces_transient_on_command_path() {
        let mut config = test_config();
        config.store.op_timeout = Duration::from_millis(20);
        let h = Harness::start_with(config);
        let lifecycle = h.container.lifecycle.clone();
        let m = lifecycle.create(seeded(1, 1, 1, "p1", "p2")).await.unwrap();

        h.container
            .store
            .inner()
            .set_latency(Some(Duration::from_millis(200)));
        let err = lifecycle.start(m.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_shutdown_stops_consumer() {
        let h = Harness::start();
        assert!(h.runtime.is_running());
        h.runtime.shutdown().await;
        assert!(!h.runtime.is_running());
    }
}
