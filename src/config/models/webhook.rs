//! Webhook delivery configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Webhook delivery configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Retries after the first attempt before a delivery is parked
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry
    pub base_retry_delay_ms: u64,
    pub max_redirects: usize,
    /// Pending queue bound per destination
    pub max_pending_per_destination: usize,
    pub sweep_interval_ms: u64,
    /// Records redriven per destination and sweep
    pub redrive_batch_size: usize,
    /// Sweeps a parked record survives before it is dropped
    pub max_redrive_attempts: u32,
    pub user_agent: String,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 3,
            base_retry_delay_ms: 2_000,
            max_redirects: 3,
            max_pending_per_destination: 100,
            sweep_interval_ms: 5_000,
            redrive_batch_size: 5,
            max_redrive_attempts: 3,
            user_agent: format!("wa-gateway-webhook/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl WebhookSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}
