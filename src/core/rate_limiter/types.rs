//! Rate limiter types and data structures

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counter for one key within one fixed window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEntry {
    pub key: String,
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
    /// Never earlier than `window_reset_at`
    pub expires_at: DateTime<Utc>,
}

impl WindowEntry {
    /// An empty window starting at `now`
    pub(crate) fn fresh(key: &str, now: DateTime<Utc>, window_ms: u64) -> Self {
        let reset_at = now
            .checked_add_signed(Duration::milliseconds(window_ms.min(i64::MAX as u64) as i64))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            key: key.to_string(),
            count: 0,
            window_reset_at: reset_at,
            expires_at: reset_at,
        }
    }

    /// Whether the entry is logically absent at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Milliseconds until the window resets, floored at zero
    pub fn millis_until_reset(&self, now: DateTime<Utc>) -> u64 {
        (self.window_reset_at - now).num_milliseconds().max(0) as u64
    }
}

/// What the admission layer knows about an inbound request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Client address as seen by the server (after proxy resolution)
    pub ip: Option<String>,
    /// Session the request targets, if any
    pub session_id: Option<String>,
    pub method: String,
    pub path: String,
    /// Header values keyed by lowercase name
    pub headers: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Result of an admission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny {
        retry_after_secs: u64,
        limit: u32,
        window_ms: u64,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Advisory counters reported alongside a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub count: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Seconds until `reset_at`, rounded up
    pub reset_after_secs: u64,
    pub window_ms: u64,
}

impl RateLimitInfo {
    pub(crate) fn from_entry(entry: &WindowEntry, limit: u32, window_ms: u64, now: DateTime<Utc>) -> Self {
        Self {
            limit,
            count: entry.count,
            remaining: limit.saturating_sub(entry.count),
            reset_at: entry.window_reset_at,
            reset_after_secs: entry.millis_until_reset(now).div_ceil(1000),
            window_ms,
        }
    }
}

/// Final outcome of a request that was admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOutcome {
    pub status: u16,
}

impl RequestOutcome {
    pub fn from_status(status: u16) -> Self {
        Self { status }
    }

    /// Anything below 400 counts as a successful response
    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// One key's usage in a stats listing
#[derive(Debug, Clone, Serialize)]
pub struct ConsumerEntry {
    pub key: String,
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

/// Usage summary for one policy
#[derive(Debug, Clone, Serialize)]
pub struct ConsumerStats {
    pub policy: String,
    pub limit: u32,
    pub window_ms: u64,
    pub active_keys: usize,
    /// Heaviest consumers first
    pub top_consumers: Vec<ConsumerEntry>,
}
