//! # Match State Machine
//!
//! ```text
//!                 start              report-result
//!   Scheduled ──────────→ InProgress ─────────────→ PendingValidation
//!       │                  │    ↑                        │     │
//!       │                  │    └──── validate(reject) ──┘     │
//!       │                  │ complete                          │ validate(accept)
//!       │                  ▼                                   ▼
//!       │              Completed ←─────────────────────────────┘
//!       │
//!       └── cancel (from any non-terminal state) ──→ Cancelled
//! ```
//!
//! Planners here are pure: they check preconditions against a snapshot and
//! return the patch to write. The service applies the patch with a
//! conditional write guarded on the snapshot's status.

use crate::domain::commands::{CompleteMatch, MatchUpdate, ReportResult};
use chrono::{DateTime, Utc};
use shared_types::{Match, MatchError, MatchPatch, MatchResult, MatchStatus, PlayerId, Slot};

/// Operations that act on an existing match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Start,
    ReportResult,
    AcceptResult,
    RejectResult,
    Complete,
    Cancel,
    Update,
    Delete,
}

impl Operation {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operation::Start => "start",
            Operation::ReportResult => "report a result for",
            Operation::AcceptResult => "accept the result of",
            Operation::RejectResult => "reject the result of",
            Operation::Complete => "complete",
            Operation::Cancel => "cancel",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// Statuses the operation may start from.
    #[must_use]
    pub fn sources(self) -> &'static [MatchStatus] {
        use MatchStatus::*;
        match self {
            Operation::Start => &[Scheduled],
            Operation::ReportResult | Operation::Complete => &[InProgress],
            Operation::AcceptResult | Operation::RejectResult => &[PendingValidation],
            Operation::Cancel | Operation::Update => &[Scheduled, InProgress, PendingValidation],
            Operation::Delete => &[Scheduled, InProgress, PendingValidation, Cancelled],
        }
    }

    /// Status after the operation, if it changes status.
    #[must_use]
    pub fn target(self) -> Option<MatchStatus> {
        match self {
            Operation::Start | Operation::RejectResult => Some(MatchStatus::InProgress),
            Operation::ReportResult => Some(MatchStatus::PendingValidation),
            Operation::AcceptResult | Operation::Complete => Some(MatchStatus::Completed),
            Operation::Cancel => Some(MatchStatus::Cancelled),
            Operation::Update | Operation::Delete => None,
        }
    }

    /// Fail with `IllegalTransition` unless `status` is a valid source.
    pub fn check(self, status: MatchStatus) -> MatchResult<()> {
        if self.sources().contains(&status) {
            Ok(())
        } else {
            Err(MatchError::IllegalTransition {
                operation: self.name(),
                status,
            })
        }
    }
}

/// Edges of the status graph.
#[must_use]
pub fn is_edge(from: MatchStatus, to: MatchStatus) -> bool {
    use MatchStatus::*;
    matches!(
        (from, to),
        (Scheduled, InProgress)
            | (Scheduled, Cancelled)
            | (InProgress, PendingValidation)
            | (InProgress, Completed)
            | (InProgress, Cancelled)
            | (PendingValidation, Completed)
            | (PendingValidation, InProgress)
            | (PendingValidation, Cancelled)
    )
}

fn status_patch(op: Operation) -> MatchPatch {
    MatchPatch {
        status: op.target(),
        ..MatchPatch::default()
    }
}

fn require_slot_member(m: &Match, player: &PlayerId) -> MatchResult<Slot> {
    m.slot_of(player).ok_or_else(|| {
        MatchError::validation(format!(
            "winner {player} is not a participant of match {}",
            m.id
        ))
    })
}

pub fn plan_start(m: &Match, now: DateTime<Utc>) -> MatchResult<MatchPatch> {
    Operation::Start.check(m.status)?;
    if !m.has_players() {
        return Err(MatchError::validation(
            "both player slots must be filled before a match can start",
        ));
    }
    Ok(MatchPatch {
        started_at: Some(now),
        ..status_patch(Operation::Start)
    })
}

pub fn plan_report(m: &Match, report: &ReportResult) -> MatchResult<MatchPatch> {
    Operation::ReportResult.check(m.status)?;
    Ok(MatchPatch {
        player1_score: Some(report.player1_score),
        player2_score: Some(report.player2_score),
        notes: report.notes.clone(),
        ..status_patch(Operation::ReportResult)
    })
}

/// Accept a reported result. The winner comes from the higher score unless
/// overridden; a tie without override is rejected.
pub fn plan_accept(
    m: &Match,
    winner_override: Option<&PlayerId>,
    now: DateTime<Utc>,
) -> MatchResult<MatchPatch> {
    Operation::AcceptResult.check(m.status)?;
    if !m.has_players() {
        return Err(MatchError::validation(
            "a winner needs both player slots filled",
        ));
    }

    let winner = match winner_override {
        Some(player) => {
            require_slot_member(m, player)?;
            player.clone()
        }
        None => {
            let slot = match m.player1_score.cmp(&m.player2_score) {
                std::cmp::Ordering::Greater => Slot::A,
                std::cmp::Ordering::Less => Slot::B,
                std::cmp::Ordering::Equal => {
                    return Err(MatchError::validation(
                        "reported scores are tied; a winner override is required",
                    ))
                }
            };
            m.slot(slot)
                .cloned()
                .ok_or_else(|| MatchError::validation("winning slot is empty"))?
        }
    };

    Ok(MatchPatch {
        winner: Some(Some(winner)),
        completed_at: Some(now),
        ..status_patch(Operation::AcceptResult)
    })
}

/// Reject a reported result: back to play, reported scores discarded.
pub fn plan_reject(m: &Match, reason: Option<&str>) -> MatchResult<MatchPatch> {
    Operation::RejectResult.check(m.status)?;
    Ok(MatchPatch {
        player1_score: Some(0),
        player2_score: Some(0),
        notes: reason.map(str::to_string),
        ..status_patch(Operation::RejectResult)
    })
}

pub fn plan_complete(
    m: &Match,
    complete: &CompleteMatch,
    now: DateTime<Utc>,
) -> MatchResult<MatchPatch> {
    Operation::Complete.check(m.status)?;
    if complete.player1_score == complete.player2_score {
        return Err(MatchError::validation(format!(
            "tied score {}-{} cannot complete a match",
            complete.player1_score, complete.player2_score
        )));
    }
    require_slot_member(m, &complete.winner)?;

    Ok(MatchPatch {
        player1_score: Some(complete.player1_score),
        player2_score: Some(complete.player2_score),
        winner: Some(Some(complete.winner.clone())),
        completed_at: Some(now),
        ..status_patch(Operation::Complete)
    })
}

pub fn plan_cancel(m: &Match, reason: Option<&str>) -> MatchResult<MatchPatch> {
    Operation::Cancel.check(m.status)?;
    Ok(MatchPatch {
        notes: reason.map(str::to_string),
        ..status_patch(Operation::Cancel)
    })
}

pub fn plan_update(m: &Match, update: &MatchUpdate) -> MatchResult<MatchPatch> {
    Operation::Update.check(m.status)?;
    if update.is_empty() {
        return Err(MatchError::validation("update contains no fields"));
    }

    let slot_a = update.slot_a.as_ref().or(m.slot_a.as_ref());
    let slot_b = update.slot_b.as_ref().or(m.slot_b.as_ref());
    if let (Some(a), Some(b)) = (slot_a, slot_b) {
        if a == b {
            return Err(MatchError::validation(format!(
                "player {a} cannot occupy both slots"
            )));
        }
    }
    Ok(update.clone().into_patch())
}

/// Soft delete is refused once a match is completed.
pub fn check_delete(m: &Match) -> MatchResult<()> {
    if m.status == MatchStatus::Completed {
        return Err(MatchError::validation("completed matches cannot be deleted"));
    }
    Operation::Delete.check(m.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::MatchId;

    const ALL: [MatchStatus; 5] = [
        MatchStatus::Scheduled,
        MatchStatus::InProgress,
        MatchStatus::PendingValidation,
        MatchStatus::Completed,
        MatchStatus::Cancelled,
    ];

    const OPS: [Operation; 6] = [
        Operation::Start,
        Operation::ReportResult,
        Operation::AcceptResult,
        Operation::RejectResult,
        Operation::Complete,
        Operation::Cancel,
    ];

    fn snapshot(status: MatchStatus) -> Match {
        let now = Utc::now();
        Match {
            id: MatchId::new(),
            tournament_id: 1,
            round: 1,
            match_number: 1,
            slot_a: Some(PlayerId::from("p1")),
            slot_b: Some(PlayerId::from("p2")),
            winner: None,
            player1_score: 0,
            player2_score: 0,
            status,
            scheduled_at: None,
            started_at: None,
            completed_at: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_every_status_change_follows_an_edge() {
        for from in ALL {
            for op in OPS {
                let target = op.target().unwrap();
                match op.check(from) {
                    Ok(()) => assert!(is_edge(from, target), "{op:?} from {from} to {target}"),
                    Err(e) => assert!(matches!(e, MatchError::IllegalTransition { .. })),
                }
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_edges() {
        for to in ALL {
            assert!(!is_edge(MatchStatus::Completed, to));
            assert!(!is_edge(MatchStatus::Cancelled, to));
        }
    }

    #[test]
    fn test_start_requires_both_slots() {
        let mut m = snapshot(MatchStatus::Scheduled);
        m.slot_b = None;
        let err = plan_start(&m, Utc::now()).unwrap_err();
        assert!(matches!(err, MatchError::Validation(_)));

        m.slot_b = Some(PlayerId::from("p2"));
        let patch = plan_start(&m, Utc::now()).unwrap();
        assert_eq!(patch.status, Some(MatchStatus::InProgress));
        assert!(patch.started_at.is_some());
    }

    #[test]
    fn test_complete_rejects_every_tie() {
        let m = snapshot(MatchStatus::InProgress);
        for score in 0..50 {
            let err = plan_complete(
                &m,
                &CompleteMatch {
                    player1_score: score,
                    player2_score: score,
                    winner: PlayerId::from("p1"),
                },
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(err, MatchError::Validation(_)), "score {score}");
        }
    }

    #[test]
    fn test_complete_requires_participant_winner() {
        let m = snapshot(MatchStatus::InProgress);
        let err = plan_complete(
            &m,
            &CompleteMatch {
                player1_score: 3,
                player2_score: 1,
                winner: PlayerId::from("outsider"),
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, MatchError::Validation(_)));
    }

    #[test]
    fn test_accept_derives_winner_from_scores() {
        let mut m = snapshot(MatchStatus::PendingValidation);
        m.player1_score = 1;
        m.player2_score = 4;
        let patch = plan_accept(&m, None, Utc::now()).unwrap();
        assert_eq!(patch.winner, Some(Some(PlayerId::from("p2"))));
        assert_eq!(patch.status, Some(MatchStatus::Completed));
    }

    #[test]
    fn test_accept_tie_needs_override() {
        let mut m = snapshot(MatchStatus::PendingValidation);
        m.player1_score = 2;
        m.player2_score = 2;
        assert!(plan_accept(&m, None, Utc::now()).is_err());

        let patch = plan_accept(&m, Some(&PlayerId::from("p1")), Utc::now()).unwrap();
        assert_eq!(patch.winner, Some(Some(PlayerId::from("p1"))));
    }

    #[test]
    fn test_reject_discards_scores() {
        let mut m = snapshot(MatchStatus::PendingValidation);
        m.player1_score = 5;
        let patch = plan_reject(&m, Some("scoreboard photo unreadable")).unwrap();
        assert_eq!(patch.status, Some(MatchStatus::InProgress));
        assert_eq!((patch.player1_score, patch.player2_score), (Some(0), Some(0)));
    }

    #[test]
    fn test_cancel_sets_reason_and_refuses_terminal() {
        let patch = plan_cancel(&snapshot(MatchStatus::InProgress), Some("venue closed")).unwrap();
        assert_eq!(patch.notes.as_deref(), Some("venue closed"));
        assert!(plan_cancel(&snapshot(MatchStatus::Completed), None).is_err());
        assert!(plan_cancel(&snapshot(MatchStatus::Cancelled), None).is_err());
    }

    #[test]
    fn test_update_rules() {
        let m = snapshot(MatchStatus::Scheduled);
        assert!(plan_update(&m, &MatchUpdate::default()).is_err());

        let same_player = MatchUpdate {
            slot_b: Some(PlayerId::from("p1")),
            ..MatchUpdate::default()
        };
        assert!(plan_update(&m, &same_player).is_err());

        let notes = MatchUpdate {
            notes: Some("moved to court 2".into()),
            ..MatchUpdate::default()
        };
        let patch = plan_update(&m, &notes).unwrap();
        assert_eq!(patch.status, None);
        assert!(plan_update(&snapshot(MatchStatus::Completed), &notes).is_err());
    }

    #[test]
    fn test_delete_rules() {
        assert!(check_delete(&snapshot(MatchStatus::Completed)).is_err());
        assert!(check_delete(&snapshot(MatchStatus::Cancelled)).is_ok());
        assert!(check_delete(&snapshot(MatchStatus::InProgress)).is_ok());
    }
}
