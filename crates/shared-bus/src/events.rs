//! # Bus Events
//!
//! The wire envelope carried by the bus and the routing-key filter used by
//! queue bindings and observer subscriptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::MatchEvent;
use uuid::Uuid;

/// Message envelope as it travels on the exchange.
///
/// `data` is deliberately untyped here: the gateway decodes it into a
/// typed event exactly once, at the consuming edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique per published message; redeliveries keep the same id.
    #[serde(default = "Uuid::new_v4")]
    pub event_id: Uuid,
    pub event_type: String,
    pub routing_key: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(
        routing_key: impl Into<String>,
        event_type: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type.into(),
            routing_key: routing_key.into(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// Wrap a domain event.
    pub fn from_match_event(event: &MatchEvent) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            event.routing_key(),
            event.event_type(),
            event.payload()?,
        ))
    }

    /// Wrap this envelope for the dead-letter topic.
    #[must_use]
    pub fn dead_lettered(&self, deliveries: u32) -> Self {
        Self::new(
            crate::DLQ_TOPIC,
            "DEAD_LETTER",
            serde_json::json!({
                "original": self,
                "deliveries": deliveries,
            }),
        )
    }
}

/// Match a routing key against an AMQP-style topic pattern.
///
/// `*` matches exactly one dot-separated word, `#` matches zero or more.
#[must_use]
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();
    match_words(&pattern, &key)
}

fn match_words(pattern: &[&str], key: &[&str]) -> bool {
    match (pattern.first(), key.first()) {
        (None, None) => true,
        (Some(&"#"), _) => {
            // Zero words, or consume one and stay on `#`.
            match_words(&pattern[1..], key) || (!key.is_empty() && match_words(pattern, &key[1..]))
        }
        (Some(&"*"), Some(_)) => match_words(&pattern[1..], &key[1..]),
        (Some(p), Some(k)) if p == k => match_words(&pattern[1..], &key[1..]),
        _ => false,
    }
}

/// Filter for subscriptions, expressed as topic patterns.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Patterns to match. Empty means all events.
    pub patterns: Vec<String>,
}

impl EventFilter {
    /// Create a filter that matches all events.
    #[must_use]
    pub fn all() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Create a filter for specific patterns.
    pub fn topics<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if an envelope matches this filter.
    #[must_use]
    pub fn matches(&self, envelope: &EventEnvelope) -> bool {
        self.patterns.is_empty()
            || self
                .patterns
                .iter()
                .any(|p| topic_matches(p, &envelope.routing_key))
    }
}
