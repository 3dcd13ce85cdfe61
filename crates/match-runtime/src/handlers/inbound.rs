//! Routes decoded inbound events to the lifecycle engine and the bracket
//! propagator.

use std::sync::Arc;

use async_trait::async_trait;
use mf_03_lifecycle::MatchLifecycleApi;
use mf_04_bracket_propagation::BracketPropagationApi;
use mf_05_event_gateway::{HandlerOutcome, InboundEventHandler};
use shared_types::{InboundEvent, MatchError};
use tracing::{debug, info, warn};

/// Notes written on matches cancelled because their tournament was deleted.
pub const TOURNAMENT_DELETED_REASON: &str = "Tournament deleted";

/// One handler per inbound event type.
pub struct InboundRouter<L, P> {
    lifecycle: Arc<L>,
    propagator: Arc<P>,
}

impl<L, P> InboundRouter<L, P> {
    pub fn new(lifecycle: Arc<L>, propagator: Arc<P>) -> Self {
        Self {
            lifecycle,
            propagator,
        }
    }
}

#[async_trait]
impl<L, P> InboundEventHandler for InboundRouter<L, P>
where
    L: MatchLifecycleApi,
    P: BracketPropagationApi,
{
    async fn handle(&self, event: InboundEvent) -> Result<HandlerOutcome, MatchError> {
        match event {
            InboundEvent::TournamentCreated {
                tournament_id,
                name,
            } => {
                info!(tournament_id, name = name.as_deref().unwrap_or(""), "Tournament created");
                Ok(HandlerOutcome::done())
            }
            InboundEvent::TournamentUpdated { tournament_id } => {
                debug!(tournament_id, "Tournament updated");
                Ok(HandlerOutcome::done())
            }
            InboundEvent::TournamentStatusChanged {
                tournament_id,
                status,
            } => {
                info!(tournament_id, %status, "Tournament status changed");
                Ok(HandlerOutcome::done())
            }
            InboundEvent::TournamentDeleted { tournament_id } => {
                let report = self
                    .lifecycle
                    .cancel_open_matches(tournament_id, Some(TOURNAMENT_DELETED_REASON.to_string()))
                    .await?;
                info!(
                    tournament_id,
                    cancelled = report.cancelled,
                    skipped = report.skipped,
                    "Tournament deleted; open matches cancelled"
                );
                Ok(HandlerOutcome::done())
            }
            InboundEvent::BracketGenerated(bracket) => {
                let tournament_id = bracket.tournament_id;
                let report = self.propagator.seed_bracket(bracket).await?;
                if !report.is_clean() {
                    warn!(
                        tournament_id,
                        created = report.created,
                        failed = report.failures.len(),
                        "Bracket seeded with failures"
                    );
                }
                Ok(HandlerOutcome::with_partial_failures(report.failures))
            }
            InboundEvent::WinnerAdvanced(advance) => {
                let outcome = self.propagator.advance_winner(advance).await?;
                if outcome.wrote() {
                    info!(match_id = %outcome.match_id(), ?outcome, "Winner advancement applied");
                } else {
                    debug!(match_id = %outcome.match_id(), "Winner advancement already applied");
                }
                Ok(HandlerOutcome::done())
            }
            InboundEvent::Unknown { event_type } => {
                warn!(%event_type, "No handler for event type");
                Ok(HandlerOutcome::done())
            }
        }
    }
}
