//! Exponential backoff between delivery attempts
//!
//! A delivery sequence moves through `Attempting(n)` until it is either
//! delivered or its retry budget is spent. Waits are plain timer sleeps on
//! the runtime, so a sequence in backoff never holds up other deliveries.

use super::manager::WebhookService;
use super::types::{DeliveryError, DeliveryOutcome, Destination};
use crate::utils::logging::{LogEvent, Outcome};
use std::time::Duration;

/// Delay after attempt `retry_count` failed: `base × 2^retry_count`
pub fn retry_delay(base_ms: u64, retry_count: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(2u64.saturating_pow(retry_count)))
}

/// Delay before the next attempt, or `None` once `max_retries` is reached
pub fn next_retry(retry_count: u32, max_retries: u32, base_ms: u64) -> Option<Duration> {
    (retry_count < max_retries).then(|| retry_delay(base_ms, retry_count))
}

/// Terminal state of a delivery sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ChainResult {
    Delivered { status: u16, retry_count: u32 },
    Exhausted { error: DeliveryError, retry_count: u32 },
}

impl WebhookService {
    /// Attempt once inline; on failure either hand the remaining attempts to a
    /// background task or park the payload.
    pub(super) async fn start_chain(
        &self,
        destination: Destination,
        payload: serde_json::Value,
        retry_count: u32,
        timeout: Duration,
    ) -> DeliveryOutcome {
        let error = match self.attempt(&destination, &payload, retry_count, timeout).await {
            Ok(response) => return DeliveryOutcome::delivered(response.status, retry_count),
            Err(error) => error,
        };

        match self.schedule_retry(&destination, &error, retry_count) {
            Some(delay) => {
                let service = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let result = service
                        .run_chain(&destination, &payload, retry_count + 1, timeout)
                        .await;
                    if let ChainResult::Exhausted { error, retry_count } = result {
                        service
                            .park(&destination, payload, &error, retry_count)
                            .await;
                    }
                });
                DeliveryOutcome::retrying(&error, retry_count)
            }
            None => {
                self.park(&destination, payload, &error, retry_count).await;
                DeliveryOutcome::exhausted(&error, retry_count)
            }
        }
    }

    /// Run attempts from `retry_count` until delivered or out of budget
    pub(super) async fn run_chain(
        &self,
        destination: &Destination,
        payload: &serde_json::Value,
        mut retry_count: u32,
        timeout: Duration,
    ) -> ChainResult {
        loop {
            match self.attempt(destination, payload, retry_count, timeout).await {
                Ok(response) => {
                    return ChainResult::Delivered {
                        status: response.status,
                        retry_count,
                    };
                }
                Err(error) => match self.schedule_retry(destination, &error, retry_count) {
                    Some(delay) => {
                        tokio::time::sleep(delay).await;
                        retry_count += 1;
                    }
                    None => return ChainResult::Exhausted { error, retry_count },
                },
            }
        }
    }

    fn schedule_retry(
        &self,
        destination: &Destination,
        error: &DeliveryError,
        retry_count: u32,
    ) -> Option<Duration> {
        let delay = next_retry(
            retry_count,
            self.settings.max_retries,
            self.settings.base_retry_delay_ms,
        )?;

        LogEvent::new("webhook.retry", Outcome::Scheduled, destination.session_id.as_str())
            .field("error", error.to_string())
            .field("retry_count", retry_count + 1)
            .field("max_retries", self.settings.max_retries)
            .field("delay_ms", delay.as_millis() as u64)
            .info();
        Some(delay)
    }

    /// Hand an exhausted payload to the pending queue
    async fn park(
        &self,
        destination: &Destination,
        payload: serde_json::Value,
        error: &DeliveryError,
        retry_count: u32,
    ) {
        LogEvent::new("webhook.retry", Outcome::Exhausted, destination.session_id.as_str())
            .field("url", &destination.url)
            .field("error", error.to_string())
            .field("retry_count", retry_count)
            .warn();

        self.enqueue_pending(&destination.session_id, payload, error.to_string())
            .await;
    }
}
