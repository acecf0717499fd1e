//! Inspection and maintenance helpers for admission controllers

use super::limiter::AdmissionController;
use super::store::{StoreResult, WindowStore};
use super::types::{ConsumerEntry, ConsumerStats, RateLimitInfo};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

impl AdmissionController {
    /// Current usage of a derived key (e.g. `ip:1.2.3.4`) under this policy
    pub fn get_status(&self, key: &str) -> StoreResult<Option<RateLimitInfo>> {
        let now = self.clock.now();
        let entry = self.store.get(&self.namespaced(key))?;
        Ok(entry.map(|entry| {
            RateLimitInfo::from_entry(&entry, self.policy.max_requests, self.policy.window_ms, now)
        }))
    }

    /// Forget a derived key's window; returns whether one existed
    pub fn reset(&self, key: &str) -> StoreResult<bool> {
        let removed = self.store.reset(&self.namespaced(key))?;
        if removed {
            debug!(policy = %self.policy.name, key, "rate limit window reset");
        }
        Ok(removed)
    }

    /// Usage summary with the `top_n` heaviest keys
    pub fn get_stats(&self, top_n: usize) -> StoreResult<ConsumerStats> {
        let prefix = self.namespaced("");
        let mut entries = self.store.scan_prefix(&prefix)?;
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

        let active_keys = entries.len();
        let top_consumers = entries
            .into_iter()
            .take(top_n)
            .map(|entry| ConsumerEntry {
                key: entry
                    .key
                    .strip_prefix(&prefix)
                    .unwrap_or(&entry.key)
                    .to_string(),
                count: entry.count,
                reset_at: entry.window_reset_at,
            })
            .collect();

        Ok(ConsumerStats {
            policy: self.policy.name.clone(),
            limit: self.policy.max_requests,
            window_ms: self.policy.window_ms,
            active_keys,
            top_consumers,
        })
    }
}

/// Periodically drop expired windows from `store`.
///
/// Purely a memory bound; increments already treat stale entries as absent.
pub fn spawn_cleanup_task(store: Arc<dyn WindowStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            match store.remove_expired() {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "expired rate limit windows removed"),
                Err(e) => warn!(error = %e, "rate limit cleanup failed"),
            }
        }
    })
}
