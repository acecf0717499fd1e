//! Structured logging utilities
//!
//! Every admission decision and every webhook delivery step is reported as a
//! single `tracing` event carrying the same four fields: the event name, an
//! outcome tag, the subject (rate-limit key or session id) and a JSON map of
//! free-form metadata, e.g. `event="webhook.redrive" outcome="dropped"`.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::Level;

/// Outcome tag attached to a structured event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Allowed,
    Denied,
    Skipped,
    Success,
    Failure,
    Scheduled,
    Exhausted,
    Queued,
    Evicted,
    Dropped,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Allowed => "allowed",
            Outcome::Denied => "denied",
            Outcome::Skipped => "skipped",
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Scheduled => "scheduled",
            Outcome::Exhausted => "exhausted",
            Outcome::Queued => "queued",
            Outcome::Evicted => "evicted",
            Outcome::Dropped => "dropped",
            Outcome::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single structured log event
#[derive(Debug, Clone)]
pub struct LogEvent {
    event: &'static str,
    outcome: Outcome,
    subject: String,
    metadata: Map<String, Value>,
}

impl LogEvent {
    /// Create a new event for `subject`
    pub fn new(event: &'static str, outcome: Outcome, subject: impl Into<String>) -> Self {
        Self {
            event,
            outcome,
            subject: subject.into(),
            metadata: Map::new(),
        }
    }

    /// Add a metadata field; values that fail to serialize are dropped
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.metadata.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add every entry of an existing metadata map
    pub fn fields(mut self, extra: &Map<String, Value>) -> Self {
        for (key, value) in extra {
            self.metadata.insert(key.clone(), value.clone());
        }
        self
    }

    pub fn event(&self) -> &'static str {
        self.event
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn debug(self) {
        self.emit(Level::DEBUG)
    }

    pub fn info(self) {
        self.emit(Level::INFO)
    }

    pub fn warn(self) {
        self.emit(Level::WARN)
    }

    pub fn error(self) {
        self.emit(Level::ERROR)
    }

    /// Emit the event at `level`
    pub fn emit(self, level: Level) {
        let metadata = Value::Object(self.metadata);
        let event = self.event;
        let outcome = self.outcome.as_str();
        let subject = self.subject.as_str();

        match level {
            Level::ERROR => {
                tracing::error!(event, outcome, subject, metadata = %metadata, "{}", event)
            }
            Level::WARN => {
                tracing::warn!(event, outcome, subject, metadata = %metadata, "{}", event)
            }
            Level::INFO => {
                tracing::info!(event, outcome, subject, metadata = %metadata, "{}", event)
            }
            Level::DEBUG => {
                tracing::debug!(event, outcome, subject, metadata = %metadata, "{}", event)
            }
            Level::TRACE => {
                tracing::trace!(event, outcome, subject, metadata = %metadata, "{}", event)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_fields() {
        let event = LogEvent::new("rate_limit.check", Outcome::Denied, "ip:1.2.3.4")
            .field("count", 31)
            .field("limit", 30)
            .field("path", "/sessions/a/events");

        assert_eq!(event.event(), "rate_limit.check");
        assert_eq!(event.outcome(), Outcome::Denied);
        assert_eq!(event.subject(), "ip:1.2.3.4");
        assert_eq!(event.metadata()["count"], 31);
        assert_eq!(event.metadata()["path"], "/sessions/a/events");
    }

    #[test]
    fn test_log_event_merges_metadata() {
        let mut extra = Map::new();
        extra.insert("method".to_string(), Value::from("POST"));

        let event = LogEvent::new("webhook.attempt", Outcome::Failure, "s1")
            .field("status", 502)
            .fields(&extra);

        assert_eq!(event.metadata().len(), 2);
        assert_eq!(event.metadata()["method"], "POST");
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_string(&Outcome::Exhausted).unwrap(),
            "\"exhausted\""
        );
        assert_eq!(Outcome::Dropped.to_string(), "dropped");
    }

    #[test]
    fn test_emit_without_subscriber_is_noop() {
        LogEvent::new("webhook.redrive", Outcome::Dropped, "s1")
            .field("redrive_attempts", 3)
            .error();
    }
}
