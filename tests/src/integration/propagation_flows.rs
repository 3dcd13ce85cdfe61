//! # Propagation Flows
//!
//! Event-path behaviour: inbound envelopes published on the tournament
//! exchange, consumed from `matches_service_queue`, applied by the bracket
//! propagator and settled according to the disposition table.

#[cfg(test)]
mod tests {
    use mf_03_lifecycle::{CompleteMatch, MatchLifecycleApi};
    use mf_05_event_gateway::FailureClass;
    use serde_json::json;
    use shared_types::{routing, MatchFilter, MatchKey, MatchStatus, PlayerId};

    use crate::integration::fixtures::{eventually, seeded, Harness};

    fn next_match(tournament: u64, round: u32, number: u32, winner: &str, slot: &str) -> serde_json::Value {
        json!({
            "tournament_id": tournament,
            "round": round,
            "match_number": number,
            "winner_id": winner,
            "target_slot": slot,
        })
    }

    #[tokio::test]
    async fn test_duplicate_winner_delivery_creates_one_row() {
        let mut h = Harness::start();
        let data = next_match(1, 2, 1, "P1", "A");

        h.publish(routing::BRACKET_NEXT_MATCH, "BRACKET_UPDATE_NEXT_MATCH", data.clone())
            .await;
        h.publish(routing::BRACKET_NEXT_MATCH, "BRACKET_UPDATE_NEXT_MATCH", data)
            .await;
        h.acked(2).await;

        let row = h.by_key(MatchKey::new(1, 2, 1)).await.unwrap();
        assert_eq!(row.slot_a, Some(PlayerId::from("P1")));
        assert_eq!(row.slot_b, None);
        assert_eq!(row.status, MatchStatus::Scheduled);
        assert_eq!(h.container.store.inner().live_count(), 1);

        assert_eq!(h.outbound_keys(), vec![routing::MATCH_CREATED]);
        assert!(h.container.ledger.is_empty());
        assert_eq!(h.runtime.consumer_stats().requeued, 0);
    }

    #[tokio::test]
    async fn test_contradiction_acked_and_recorded() {
        let h = Harness::start();
        h.publish(
            routing::BRACKET_NEXT_MATCH,
            "BRACKET_UPDATE_NEXT_MATCH",
            next_match(1, 2, 1, "X", "A"),
        )
        .await;
        h.publish(
            routing::BRACKET_NEXT_MATCH,
            "BRACKET_UPDATE_NEXT_MATCH",
            next_match(1, 2, 1, "Y", "A"),
        )
        .await;
        h.acked(2).await;

        let row = h.by_key(MatchKey::new(1, 2, 1)).await.unwrap();
        assert_eq!(row.slot_a, Some(PlayerId::from("X")));
        assert_eq!(h.container.ledger.count(FailureClass::Integrity), 1);
        assert_eq!(h.runtime.consumer_stats().requeued, 0);
        assert_eq!(h.container.bus.queue_depth(mf_05_event_gateway::INBOUND_QUEUE), 0);
    }

    #[tokio::test]
    async fn test_legacy_is_player1_flag_and_numeric_ids() {
        let h = Harness::start();
        h.publish(
            routing::BRACKET_NEXT_MATCH,
            "BRACKET_UPDATE_NEXT_MATCH",
            json!({
                "tournament_id": "8",
                "round": 3,
                "match_number": 2,
                "winner_id": 42,
                "is_player1": false,
                "previous_match_id": 7
            }),
        )
        .await;
        h.acked(1).await;

        let row = h.by_key(MatchKey::new(8, 3, 2)).await.unwrap();
        assert_eq!(row.slot_a, None);
        assert_eq!(row.slot_b, Some(PlayerId::from("42")));
    }

    #[tokio::test]
    async fn test_bracket_generated_seeds_and_records_partial_failures() {
        let h = Harness::start();
        h.publish(
            routing::BRACKET_GENERATED,
            "BRACKET_GENERATED",
            json!({
                "tournament_id": 5,
                "tournament_name": "Autumn Cup",
                "matches": [
                    {"round": 1, "match_number": 1, "player1_id": 1, "player2_id": 2},
                    {"round": 1, "match_number": 2, "player1_id": 3, "player2_id": 3},
                    {"round": 1, "match_number": 3, "player1_id": 5},
                    {"match_number": 4, "player1_id": 7, "player2_id": 8}
                ]
            }),
        )
        .await;
        h.acked(1).await;

        let page = h
            .container
            .lifecycle
            .list(MatchFilter::tournament(5), None, None)
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.matches[1].slot_b, None);
        // The self-pairing and the entry without a round.
        assert_eq!(h.container.ledger.count(FailureClass::PartialSeed), 2);
    }

    #[tokio::test]
    async fn test_bracket_entry_without_coordinates_is_recorded() {
        let h = Harness::start();
        h.publish(
            routing::BRACKET_GENERATED,
            "BRACKET_GENERATED",
            json!({
                "tournament_id": 1,
                "matches": [
                    {"round": 1, "match_number": 1, "player1_id": "a", "player2_id": "b"},
                    {"match_number": 4}
                ]
            }),
        )
        .await;
        h.acked(1).await;

        assert!(h.by_key(MatchKey::new(1, 1, 1)).await.is_some());
        let entries = h.container.ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].class, FailureClass::PartialSeed);
        assert!(entries[0].reason.contains("seed #1"));
        assert!(entries[0].reason.contains("round"));
        assert_eq!(h.runtime.consumer_stats().requeued, 0);
    }

    #[tokio::test]
    async fn test_full_bracket_progression() {
        let h = Harness::start();
        let lifecycle = h.container.lifecycle.clone();
        let semis = [
            lifecycle.create(seeded(3, 1, 1, "a", "b")).await.unwrap(),
            lifecycle.create(seeded(3, 1, 2, "c", "d")).await.unwrap(),
        ];

        for (semi, (winner, slot)) in semis.iter().zip([("a", "A"), ("d", "B")]) {
            lifecycle.start(semi.id).await.unwrap();
            lifecycle
                .complete(
                    semi.id,
                    CompleteMatch {
                        player1_score: if winner == "a" { 2 } else { 0 },
                        player2_score: if winner == "a" { 0 } else { 2 },
                        winner: PlayerId::from(winner),
                    },
                )
                .await
                .unwrap();
            let mut data = next_match(3, 2, 1, winner, slot);
            data["previous_match_id"] = json!(semi.id.to_string());
            h.publish(routing::BRACKET_NEXT_MATCH, "BRACKET_UPDATE_NEXT_MATCH", data)
                .await;
        }
        h.acked(2).await;

        let final_match = h.by_key(MatchKey::new(3, 2, 1)).await.unwrap();
        assert!(final_match.can_start());
        let started = lifecycle.start(final_match.id).await.unwrap();
        assert_eq!(started.status, MatchStatus::InProgress);
    }

    #[tokio::test]
    async fn test_tournament_deleted_cancels_open_matches() {
        let h = Harness::start();
        let lifecycle = h.container.lifecycle.clone();
        let open = lifecycle.create(seeded(6, 1, 1, "a", "b")).await.unwrap();
        let live = lifecycle.create(seeded(6, 1, 2, "c", "d")).await.unwrap();
        lifecycle.start(live.id).await.unwrap();

        h.publish(
            routing::TOURNAMENT_DELETED,
            "TOURNAMENT_DELETED",
            json!({"id": 6}),
        )
        .await;
        h.acked(1).await;

        for id in [open.id, live.id] {
            assert_eq!(
                lifecycle.get(id).await.unwrap().status,
                MatchStatus::Cancelled
            );
        }
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_events_are_acked() {
        let h = Harness::start();
        h.publish(
            routing::BRACKET_NEXT_MATCH,
            "BRACKET_UPDATE_NEXT_MATCH",
            json!({"tournament_id": 1, "round": 2}),
        )
        .await;
        h.publish("tournament.status.archived", "TOURNAMENT_ARCHIVED", json!({"id": 1}))
            .await;
        h.publish(
            "tournament.status.in_progress",
            "TOURNAMENT_STATUS_CHANGED",
            json!({"tournament_id": 1, "new_status": "in_progress"}),
        )
        .await;
        h.acked(3).await;

        assert_eq!(h.container.ledger.count(FailureClass::Malformed), 1);
        assert_eq!(h.container.ledger.len(), 1);
        eventually("empty inbound queue", || {
            h.container.bus.queue_depth(mf_05_event_gateway::INBOUND_QUEUE) == 0
        })
        .await;
        assert_eq!(h.container.store.inner().live_count(), 0);
    }
}
