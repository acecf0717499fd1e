//! Pending queue and redrive sweeper
//!
//! Payloads whose retry budget ran out wait here, per destination and oldest
//! first, bounded by `max_pending_per_destination`. A single sweeper walks
//! every queue on a fixed tick and redrives a small batch from each reachable
//! destination with a fresh retry budget.

use super::manager::WebhookService;
use super::retry::ChainResult;
use super::types::{PendingDelivery, SweepReport};
use crate::utils::logging::{LogEvent, Outcome};
use chrono::Utc;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

impl WebhookService {
    /// Park a payload for later redrive
    pub async fn enqueue_pending(
        &self,
        session_id: &str,
        payload: serde_json::Value,
        failure_reason: String,
    ) {
        let record = PendingDelivery {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            payload,
            failure_reason,
            enqueued_at: Utc::now(),
            redrive_attempts: 0,
        };
        self.push_pending(record).await;
    }

    /// Append to the back of the destination's queue, evicting from the front
    /// when the bound is exceeded
    async fn push_pending(&self, record: PendingDelivery) {
        let limit = self.settings.max_pending_per_destination;
        let session_id = record.session_id.clone();
        let redrive_attempts = record.redrive_attempts;

        let (len, evicted) = {
            let mut data = self.data.write().await;
            let queue = data.pending.entry(session_id.clone()).or_default();
            queue.push_back(record);

            let mut evicted = Vec::new();
            while queue.len() > limit {
                if let Some(oldest) = queue.pop_front() {
                    evicted.push(oldest);
                }
            }
            (queue.len(), evicted)
        };

        LogEvent::new("webhook.pending", Outcome::Queued, session_id.as_str())
            .field("pending_count", len)
            .field("redrive_attempts", redrive_attempts)
            .info();

        for record in evicted {
            LogEvent::new("webhook.pending", Outcome::Evicted, session_id.as_str())
                .field("id", &record.id)
                .field("enqueued_at", record.enqueued_at)
                .field("limit", limit)
                .warn();
        }
    }

    /// Take up to `count` records from the front of a queue
    async fn take_pending(&self, session_id: &str, count: usize) -> Vec<PendingDelivery> {
        let mut data = self.data.write().await;
        let Some(queue) = data.pending.get_mut(session_id) else {
            return Vec::new();
        };
        let count = count.min(queue.len());
        let batch: Vec<PendingDelivery> = queue.drain(..count).collect();
        if queue.is_empty() {
            data.pending.remove(session_id);
        }
        batch
    }

    /// Run one sweep over every destination with pending records.
    ///
    /// Destinations are swept concurrently; records of one destination are
    /// redriven one after the other, oldest first.
    pub async fn sweep_pending(&self) -> SweepReport {
        let destinations: Vec<String> = {
            let data = self.data.read().await;
            data.pending
                .iter()
                .filter(|(_, queue)| !queue.is_empty())
                .map(|(session_id, _)| session_id.clone())
                .collect()
        };

        let reports = join_all(
            destinations
                .iter()
                .map(|session_id| self.redrive_destination(session_id)),
        )
        .await;

        let mut report = SweepReport::default();
        for partial in reports {
            report.merge(partial);
        }
        if report.redelivered + report.requeued + report.dropped > 0 {
            debug!(?report, "webhook sweep finished");
        }
        report
    }

    async fn redrive_destination(&self, session_id: &str) -> SweepReport {
        let mut report = SweepReport::default();

        if !self.sessions.is_connected(session_id).await {
            LogEvent::new("webhook.redrive", Outcome::Skipped, session_id)
                .field("reason", "not_connected")
                .debug();
            report.unreachable = 1;
            return report;
        }
        report.destinations = 1;

        let batch = self
            .take_pending(session_id, self.settings.redrive_batch_size)
            .await;

        let Some(destination) = self.destination(session_id).await else {
            for record in batch {
                self.drop_pending(&record, "no_webhook_url");
                report.dropped += 1;
            }
            return report;
        };

        let timeout = self.settings.timeout();
        for mut record in batch {
            match self
                .run_chain(&destination, &record.payload, 0, timeout)
                .await
            {
                ChainResult::Delivered { status, retry_count } => {
                    LogEvent::new("webhook.redrive", Outcome::Success, session_id)
                        .field("id", &record.id)
                        .field("status", status)
                        .field("retry_count", retry_count)
                        .field("redrive_attempts", record.redrive_attempts)
                        .info();
                    report.redelivered += 1;
                }
                ChainResult::Exhausted { error, .. }
                    if record.redrive_attempts < self.settings.max_redrive_attempts =>
                {
                    record.redrive_attempts += 1;
                    record.failure_reason = error.to_string();
                    LogEvent::new("webhook.redrive", Outcome::Failure, session_id)
                        .field("id", &record.id)
                        .field("error", error.to_string())
                        .field("redrive_attempts", record.redrive_attempts)
                        .warn();
                    self.push_pending(record).await;
                    report.requeued += 1;
                }
                ChainResult::Exhausted { error, .. } => {
                    record.failure_reason = error.to_string();
                    self.drop_pending(&record, "redrive_exhausted");
                    report.dropped += 1;
                }
            }
        }

        report
    }

    fn drop_pending(&self, record: &PendingDelivery, reason: &str) {
        LogEvent::new("webhook.redrive", Outcome::Dropped, record.session_id.as_str())
            .field("id", &record.id)
            .field("reason", reason)
            .field("failure_reason", &record.failure_reason)
            .field("redrive_attempts", record.redrive_attempts)
            .field("enqueued_at", record.enqueued_at)
            .field("payload", &record.payload)
            .error();
    }

    /// Start the shared sweeper tick.
    ///
    /// Each tick runs its sweep on its own task so a slow destination in
    /// backoff does not stretch the tick.
    pub fn start_sweeper(&self) -> JoinHandle<()> {
        let service = self.clone();
        let every = self.settings.sweep_interval();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let sweeper = service.clone();
                tokio::spawn(async move {
                    sweeper.sweep_pending().await;
                });
            }
        });

        info!(interval_ms = every.as_millis() as u64, "Started webhook sweeper");
        handle
    }
}

