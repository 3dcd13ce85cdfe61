//! # Lifecycle Flows
//!
//! Command-path behaviour of the wired service: state machine edges,
//! concurrent transitions, cache coherence and outbound events on the bus.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mf_03_lifecycle::{CompleteMatch, MatchLifecycleApi, RecordResult, ReportResult, ValidationDecision};
    use shared_types::{routing, ErrorKind, MatchError, MatchFilter, MatchStatus, PlayerId};

    use crate::integration::fixtures::{seeded, Harness};

    #[tokio::test]
    async fn test_create_start_complete_then_no_further_transition() {
        let mut h = Harness::start();
        let lifecycle = h.container.lifecycle.clone();

        let m = lifecycle.create(seeded(1, 1, 1, "p1", "p2")).await.unwrap();
        let started = lifecycle.start(m.id).await.unwrap();
        assert_eq!(started.status, MatchStatus::InProgress);

        let done = lifecycle
            .complete(
                m.id,
                CompleteMatch {
                    player1_score: 3,
                    player2_score: 1,
                    winner: PlayerId::from("p1"),
                },
            )
            .await
            .unwrap();
        assert_eq!(done.status, MatchStatus::Completed);
        assert_eq!(done.winner, Some(PlayerId::from("p1")));

        let err = lifecycle.cancel(m.id, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(
            h.outbound_keys(),
            vec![
                routing::MATCH_CREATED,
                routing::MATCH_STARTED,
                routing::MATCH_COMPLETED
            ]
        );
        h.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_tied_complete_always_rejected() {
        let h = Harness::start();
        let lifecycle = h.container.lifecycle.clone();
        let m = lifecycle.create(seeded(1, 1, 1, "p1", "p2")).await.unwrap();
        lifecycle.start(m.id).await.unwrap();

        for score in [0, 1, 7, 250] {
            let err = lifecycle
                .complete(
                    m.id,
                    CompleteMatch {
                        player1_score: score,
                        player2_score: score,
                        winner: PlayerId::from("p1"),
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, MatchError::Validation(_)));
        }
        assert_eq!(
            lifecycle.get(m.id).await.unwrap().status,
            MatchStatus::InProgress
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_one_wins_other_conflicts() {
        let h = Harness::start();
        let lifecycle = h.container.lifecycle.clone();
        let m = lifecycle.create(seeded(1, 1, 1, "p1", "p2")).await.unwrap();

        // Both callers read `Scheduled` before either write lands.
        h.container
            .store
            .inner()
            .set_latency(Some(Duration::from_millis(30)));

        let a = tokio::spawn({
            let lifecycle = lifecycle.clone();
            async move { lifecycle.start(m.id).await }
        });
        let b = tokio::spawn({
            let lifecycle = lifecycle.clone();
            async move { lifecycle.start(m.id).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(loser, MatchError::Conflict(_)));
        assert!(loser.is_retryable());

        h.container.store.inner().set_latency(None);
        assert_eq!(
            lifecycle.get(m.id).await.unwrap().status,
            MatchStatus::InProgress
        );
    }

    #[tokio::test]
    async fn test_reads_after_mutation_never_stale() {
        let h = Harness::start();
        let lifecycle = h.container.lifecycle.clone();
        let m = lifecycle.create(seeded(2, 1, 1, "p1", "p2")).await.unwrap();

        // Warm both the single-match and the list entries.
        assert_eq!(lifecycle.get(m.id).await.unwrap().status, MatchStatus::Scheduled);
        lifecycle.get(m.id).await.unwrap();
        let filter = MatchFilter::tournament(2);
        lifecycle.list(filter, None, None).await.unwrap();
        assert!(h.container.cache.stats().hits >= 1);

        lifecycle.start(m.id).await.unwrap();
        assert_eq!(lifecycle.get(m.id).await.unwrap().status, MatchStatus::InProgress);
        let page = lifecycle.list(filter, None, None).await.unwrap();
        assert_eq!(page.matches[0].status, MatchStatus::InProgress);

        lifecycle
            .report_result(
                m.id,
                ReportResult {
                    player1_score: 4,
                    player2_score: 6,
                    ..ReportResult::default()
                },
            )
            .await
            .unwrap();
        let page = lifecycle
            .list(filter.with_status(MatchStatus::PendingValidation), None, None)
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let finished = lifecycle
            .validate_result(
                m.id,
                ValidationDecision::Accept {
                    winner_override: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(finished.winner, Some(PlayerId::from("p2")));
        assert_eq!(lifecycle.get(m.id).await.unwrap().status, MatchStatus::Completed);
    }

    #[tokio::test]
    async fn test_cache_outage_degrades_to_store() {
        let h = Harness::start();
        let lifecycle = h.container.lifecycle.clone();
        let m = lifecycle.create(seeded(1, 1, 1, "p1", "p2")).await.unwrap();

        h.container.cache_backend.set_available(false);
        lifecycle.start(m.id).await.unwrap();
        assert_eq!(lifecycle.get(m.id).await.unwrap().status, MatchStatus::InProgress);
        assert!(h.container.cache.stats().degraded >= 1);

        h.container.cache_backend.set_available(true);
        assert_eq!(lifecycle.get(m.id).await.unwrap().status, MatchStatus::InProgress);
    }

    #[tokio::test]
    async fn test_broker_down_keeps_state_change() {
        let mut h = Harness::start();
        let lifecycle = h.container.lifecycle.clone();
        let m = lifecycle.create(seeded(1, 1, 1, "p1", "p2")).await.unwrap();
        h.outbound_keys();

        h.container.bus.set_connected(false);
        let started = lifecycle.start(m.id).await.unwrap();
        assert_eq!(started.status, MatchStatus::InProgress);
        assert_eq!(h.container.events.failures(), 1);
        assert!(h.outbound_keys().is_empty());

        h.container.bus.set_connected(true);
        lifecycle.cancel(m.id, Some("weather".into())).await.unwrap();
        assert_eq!(h.outbound_keys(), vec![routing::MATCH_CANCELLED]);
    }

    #[tokio::test]
    async fn test_player_results_and_delete() {
        let mut h = Harness::start();
        let lifecycle = h.container.lifecycle.clone();
        let m = lifecycle.create(seeded(1, 1, 1, "p1", "p2")).await.unwrap();

        lifecycle
            .record_player_result(
                m.id,
                RecordResult {
                    player_id: PlayerId::from("p2"),
                    score: 11,
                    is_winner: false,
                    stats: serde_json::json!({"double_faults": 2}),
                    notes: String::new(),
                },
            )
            .await
            .unwrap();
        let results = lifecycle.list_player_results(m.id).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].stats["double_faults"], 2);

        lifecycle.delete(m.id).await.unwrap();
        assert!(matches!(
            lifecycle.get(m.id).await.unwrap_err(),
            MatchError::NotFound(_)
        ));
        let page = lifecycle
            .list(MatchFilter::tournament(1), None, None)
            .await
            .unwrap();
        assert_eq!(page.total, 0);

        // The natural key is free again after a soft delete.
        lifecycle.create(seeded(1, 1, 1, "p3", "p4")).await.unwrap();

        assert_eq!(
            h.outbound_keys(),
            vec![
                routing::MATCH_CREATED,
                routing::RESULT_RECORDED,
                routing::MATCH_DELETED,
                routing::MATCH_CREATED
            ]
        );
    }
}
