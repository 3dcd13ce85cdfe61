//! # Inbound Ports
//!
//! Implemented by the composition root to route each typed inbound event to
//! the lifecycle engine or the propagation handler.

use async_trait::async_trait;
use shared_types::{InboundEvent, MatchError};

/// Result of a successfully handled inbound event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    /// Sub-units that failed without failing the event (bulk seeding).
    pub partial_failures: Vec<String>,
}

impl HandlerOutcome {
    #[must_use]
    pub fn done() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_partial_failures(partial_failures: Vec<String>) -> Self {
        Self { partial_failures }
    }
}

/// Handles one decoded inbound event.
///
/// The returned error decides acknowledgement, see
/// [`crate::Disposition::for_error`].
#[async_trait]
pub trait InboundEventHandler: Send + Sync {
    async fn handle(&self, event: InboundEvent) -> Result<HandlerOutcome, MatchError>;
}
