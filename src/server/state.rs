//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::core::clock::{Clock, SystemClock};
use crate::core::rate_limiter::{AdmissionController, AdmissionRegistry, MemoryWindowStore};
use crate::core::session::InMemorySessionRegistry;
use crate::core::webhooks::WebhookService;
use crate::utils::error::Result;
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// Every field is cheap to clone; the window store, the session registry and
/// the webhook state are process-wide and shared by all workers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    /// Session registry written by the session routes
    pub sessions: Arc<InMemorySessionRegistry>,
    /// Webhook delivery pipeline
    pub webhooks: WebhookService,
    /// Named admission controllers over one window store
    pub limiters: Arc<AdmissionRegistry>,
}

impl AppState {
    /// Create a new AppState with shared resources
    pub fn new(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create state whose rate limiting runs on `clock`
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let store = Arc::new(MemoryWindowStore::with_clock(clock.clone()));
        let limiters = AdmissionRegistry::from_settings(config.rate_limit(), store, clock);

        let sessions = Arc::new(InMemorySessionRegistry::new());
        let webhooks = WebhookService::new(config.webhook().clone(), sessions.clone())?;

        Ok(Self {
            config: Arc::new(config),
            sessions,
            webhooks,
            limiters: Arc::new(limiters),
        })
    }

    /// Get gateway configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Controller for a named policy, if rate limiting is on and it exists
    pub fn limiter(&self, name: &str) -> Option<Arc<AdmissionController>> {
        self.limiters.get(name)
    }
}
