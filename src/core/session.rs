//! Session registry collaborator
//!
//! WhatsApp sessions themselves are owned by the protocol client. The webhook
//! pipeline only needs two answers from it: where a session's events should be
//! delivered, and whether the session's connection is currently up.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Per-session webhook settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Destination for this session's events; `None` disables delivery
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Pause between consecutive messages of a batch, in milliseconds
    #[serde(default)]
    pub webhook_delay_ms: u64,
    /// Shared secret used to sign payloads
    #[serde(default, skip_serializing)]
    pub webhook_secret: Option<String>,
}

impl SessionConfig {
    pub fn with_webhook(url: impl Into<String>) -> Self {
        Self {
            webhook_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// The configured URL, ignoring blank values
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Read access to session state
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Webhook settings for `session_id`, if the session exists
    async fn get_config(&self, session_id: &str) -> Option<SessionConfig>;

    /// Whether the session's owning connection is currently active
    async fn is_connected(&self, session_id: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
struct SessionEntry {
    config: SessionConfig,
    connected: bool,
}

/// Process-local session registry
#[derive(Debug, Default)]
pub struct InMemorySessionRegistry {
    sessions: DashMap<String, SessionEntry>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a session's config, keeping its connection state
    pub fn set_config(&self, session_id: &str, config: SessionConfig) {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .config = config;
    }

    /// Record connection state, creating the session if it is unknown
    pub fn set_connected(&self, session_id: &str, connected: bool) {
        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .connected = connected;
    }

    /// Forget a session; returns whether it existed
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn get_config(&self, session_id: &str) -> Option<SessionConfig> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.config.clone())
    }

    async fn is_connected(&self, session_id: &str) -> bool {
        self.sessions
            .get(session_id)
            .is_some_and(|entry| entry.connected)
    }
}
