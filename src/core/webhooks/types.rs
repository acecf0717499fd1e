//! Webhook type definitions
//!
//! This module contains all webhook-related types, enums, and data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Why a single delivery attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// No response within the attempt timeout
    #[error("request timed out after {0}ms")]
    Timeout(u64),
    /// Connection refused, DNS failure, too many redirects...
    #[error("transport error: {0}")]
    Transport(String),
    /// The destination answered with a non-2xx status
    #[error("destination returned status {status}")]
    Rejected { status: u16, body: String },
    /// The payload could not be encoded or signed
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl DeliveryError {
    /// HTTP status of a rejected attempt
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short tag used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryError::Timeout(_) => "timeout",
            DeliveryError::Transport(_) => "transport",
            DeliveryError::Rejected { .. } => "rejected",
            DeliveryError::Encoding(_) => "encoding",
        }
    }
}

/// Successful response from a destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status: u16,
    pub body: String,
}

/// Where one session's events go
#[derive(Debug, Clone)]
pub(super) struct Destination {
    pub session_id: String,
    pub url: String,
    pub secret: Option<String>,
}

/// Per-call options for [`WebhookService::send`](super::WebhookService::send)
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Retry counter to start from
    pub retry_count: u32,
    /// Attempt timeout override in milliseconds
    pub timeout_ms: Option<u64>,
}

/// What `send` reports back to its caller. Delivery failures never surface as
/// errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub success: bool,
    /// No destination is configured for the session
    pub skipped: bool,
    pub status: Option<u16>,
    pub error: Option<String>,
    /// A retry has been scheduled in the background
    pub will_retry: bool,
    pub retry_count: u32,
    /// The retry budget is spent and the payload was parked
    pub max_retries_reached: bool,
}

impl DeliveryOutcome {
    pub(super) fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }

    pub(super) fn delivered(status: u16, retry_count: u32) -> Self {
        Self {
            success: true,
            status: Some(status),
            retry_count,
            ..Default::default()
        }
    }

    pub(super) fn retrying(error: &DeliveryError, retry_count: u32) -> Self {
        Self {
            status: error.status(),
            error: Some(error.to_string()),
            will_retry: true,
            retry_count,
            ..Default::default()
        }
    }

    pub(super) fn exhausted(error: &DeliveryError, retry_count: u32) -> Self {
        Self {
            status: error.status(),
            error: Some(error.to_string()),
            retry_count,
            max_retries_reached: true,
            ..Default::default()
        }
    }
}

/// A payload parked after its retry budget ran out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDelivery {
    pub id: String,
    pub session_id: String,
    pub payload: serde_json::Value,
    /// Failure reason of the last attempt
    pub failure_reason: String,
    pub enqueued_at: DateTime<Utc>,
    /// Sweeps that already tried and failed to redeliver this record
    pub redrive_attempts: u32,
}

/// Delivery statistics for one destination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationStats {
    pub session_id: String,
    pub total_sent: u64,
    pub total_success: u64,
    pub total_failed: u64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Filled in when stats are read
    pub pending_count: usize,
}

impl DestinationStats {
    pub(super) fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            ..Default::default()
        }
    }
}

/// Summary of one sweep over every pending queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Destinations that had pending records and were reachable
    pub destinations: usize,
    /// Destinations skipped because their connection was down
    pub unreachable: usize,
    pub redelivered: usize,
    pub requeued: usize,
    pub dropped: usize,
}

impl SweepReport {
    pub(super) fn merge(&mut self, other: SweepReport) {
        self.destinations += other.destinations;
        self.unreachable += other.unreachable;
        self.redelivered += other.redelivered;
        self.requeued += other.requeued;
        self.dropped += other.dropped;
    }
}

/// Consolidated webhook data - single lock for all webhook-related state
#[derive(Debug, Default)]
pub(super) struct WebhookData {
    /// Statistics by session id
    pub stats: HashMap<String, DestinationStats>,
    /// Pending queues by session id, oldest first
    pub pending: HashMap<String, VecDeque<PendingDelivery>>,
}
