//! Webhook service
//!
//! Owns the outbound HTTP client and the per-destination state (statistics and
//! pending queues) behind a single lock.

use super::types::{
    DeliveryOutcome, Destination, DestinationStats, PendingDelivery, SendOptions, WebhookData,
};
use crate::config::models::webhook::WebhookSettings;
use crate::core::session::SessionRegistry;
use crate::utils::error::{GatewayError, Result};
use crate::utils::logging::{LogEvent, Outcome};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Webhook delivery service
#[derive(Clone)]
pub struct WebhookService {
    /// HTTP client for webhook requests
    pub(super) client: Client,
    /// Consolidated webhook data - single lock for all related state
    pub(super) data: Arc<RwLock<WebhookData>>,
    pub(super) sessions: Arc<dyn SessionRegistry>,
    pub(super) settings: Arc<WebhookSettings>,
}

impl WebhookService {
    /// Create a new webhook service
    pub fn new(settings: WebhookSettings, sessions: Arc<dyn SessionRegistry>) -> Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| GatewayError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            data: Arc::new(RwLock::new(WebhookData::default())),
            sessions,
            settings: Arc::new(settings),
        })
    }

    pub fn settings(&self) -> &WebhookSettings {
        &self.settings
    }

    /// Resolve where `session_id`'s events go, if anywhere
    pub(super) async fn destination(&self, session_id: &str) -> Option<Destination> {
        let config = self.sessions.get_config(session_id).await?;
        let url = config.webhook_url()?.to_string();
        Some(Destination {
            session_id: session_id.to_string(),
            url,
            secret: config.webhook_secret.filter(|secret| !secret.is_empty()),
        })
    }

    /// Deliver one payload to the session's destination.
    ///
    /// The first attempt runs inline. If it fails and retries remain, the rest
    /// of the backoff chain continues in the background and the outcome
    /// reports `will_retry`; once the budget is spent the payload is parked in
    /// the pending queue.
    pub async fn send(
        &self,
        session_id: &str,
        payload: serde_json::Value,
        options: SendOptions,
    ) -> DeliveryOutcome {
        let Some(destination) = self.destination(session_id).await else {
            LogEvent::new("webhook.send", Outcome::Skipped, session_id)
                .field("reason", "no_webhook_url")
                .debug();
            return DeliveryOutcome::skipped();
        };

        let timeout = options
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.settings.timeout());
        self.start_chain(destination, payload, options.retry_count, timeout)
            .await
    }

    /// Send several payloads in order, pausing for the session's configured
    /// delay between them
    pub async fn send_batch(
        &self,
        session_id: &str,
        payloads: Vec<serde_json::Value>,
    ) -> Vec<DeliveryOutcome> {
        let delay = self
            .sessions
            .get_config(session_id)
            .await
            .map(|config| Duration::from_millis(config.webhook_delay_ms))
            .unwrap_or_default();

        let count = payloads.len();
        let mut outcomes = Vec::with_capacity(count);
        for (index, payload) in payloads.into_iter().enumerate() {
            outcomes.push(self.send(session_id, payload, SendOptions::default()).await);
            if index + 1 < count && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        outcomes
    }

    /// Statistics for one destination
    pub async fn get_stats(&self, session_id: &str) -> Option<DestinationStats> {
        let data = self.data.read().await;
        let pending_count = data.pending.get(session_id).map_or(0, |queue| queue.len());
        match data.stats.get(session_id) {
            Some(stats) => Some(DestinationStats {
                pending_count,
                ..stats.clone()
            }),
            None if pending_count > 0 => Some(DestinationStats {
                pending_count,
                ..DestinationStats::new(session_id)
            }),
            None => None,
        }
    }

    /// Statistics for every destination seen so far, ordered by session id
    pub async fn get_all_stats(&self) -> Vec<DestinationStats> {
        let data = self.data.read().await;
        let mut ids: Vec<&String> = data.stats.keys().chain(data.pending.keys()).collect();
        ids.sort();
        ids.dedup();

        ids.into_iter()
            .map(|id| DestinationStats {
                pending_count: data.pending.get(id).map_or(0, |queue| queue.len()),
                ..data
                    .stats
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| DestinationStats::new(id))
            })
            .collect()
    }

    /// Zero a destination's counters; pending records are kept
    pub async fn reset_stats(&self, session_id: &str) -> bool {
        let mut data = self.data.write().await;
        match data.stats.get_mut(session_id) {
            Some(stats) => {
                *stats = DestinationStats::new(session_id);
                true
            }
            None => false,
        }
    }

    pub async fn get_pending_count(&self, session_id: &str) -> usize {
        self.data
            .read()
            .await
            .pending
            .get(session_id)
            .map_or(0, |queue| queue.len())
    }

    /// Pending records for a destination, oldest first
    pub async fn get_pending(&self, session_id: &str) -> Vec<PendingDelivery> {
        self.data
            .read()
            .await
            .pending
            .get(session_id)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every pending record for a destination; returns how many were dropped
    pub async fn clear_pending(&self, session_id: &str) -> usize {
        let removed = self
            .data
            .write()
            .await
            .pending
            .remove(session_id)
            .map_or(0, |queue| queue.len());

        if removed > 0 {
            LogEvent::new("webhook.pending", Outcome::Dropped, session_id)
                .field("reason", "cleared")
                .field("count", removed)
                .info();
        }
        removed
    }
}

impl std::fmt::Debug for WebhookService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
