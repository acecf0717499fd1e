//! Window counter storage
//!
//! [`WindowStore`] is the seam for alternative backends; the in-process
//! [`MemoryWindowStore`] is the only one shipped. Every call is synchronous so
//! a key's read-modify-write can never straddle an `.await`.

use super::types::WindowEntry;
use crate::core::clock::{Clock, SystemClock};
use dashmap::DashMap;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Backend faults. Callers on the admission path treat these as fail-open.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("window store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid window key: {0:?}")]
    InvalidKey(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Per-key fixed-window counters with expiry
pub trait WindowStore: Send + Sync + Debug {
    /// Count one hit for `key`, opening a new window if none is live.
    ///
    /// `max_requests` is informational for backends that want to cap work;
    /// the returned count is never clamped.
    fn increment(&self, key: &str, window_ms: u64, max_requests: u32) -> StoreResult<WindowEntry>;

    /// The live entry for `key`; expired entries read as absent
    fn get(&self, key: &str) -> StoreResult<Option<WindowEntry>>;

    /// Take one hit back. No-op when the entry is absent, expired or at zero.
    fn decrement(&self, key: &str) -> StoreResult<()>;

    /// Drop the entry for `key`; returns whether one existed
    fn reset(&self, key: &str) -> StoreResult<bool>;

    /// Remove every expired entry; returns how many were removed
    fn remove_expired(&self) -> StoreResult<usize>;

    /// Live entries whose key starts with `prefix`
    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<WindowEntry>>;
}

/// In-process store.
///
/// Uses a sharded map: the shard guard is held for the whole
/// read-modify-write of a key, which serializes concurrent hits on the same
/// key without a global lock.
#[derive(Debug)]
pub struct MemoryWindowStore {
    entries: DashMap<String, WindowEntry>,
    clock: Arc<dyn Clock>,
}

impl MemoryWindowStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryWindowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowStore for MemoryWindowStore {
    fn increment(&self, key: &str, window_ms: u64, _max_requests: u32) -> StoreResult<WindowEntry> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }

        let now = self.clock.now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry::fresh(key, now, window_ms));

        if entry.is_expired(now) {
            *entry = WindowEntry::fresh(key, now, window_ms);
        }
        entry.count = entry.count.saturating_add(1);

        Ok(entry.value().clone())
    }

    fn get(&self, key: &str) -> StoreResult<Option<WindowEntry>> {
        let now = self.clock.now();
        Ok(self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value().clone()))
    }

    fn decrement(&self, key: &str) -> StoreResult<()> {
        let now = self.clock.now();
        if let Some(mut entry) = self.entries.get_mut(key) {
            if !entry.is_expired(now) {
                entry.count = entry.count.saturating_sub(1);
            }
        }
        Ok(())
    }

    fn reset(&self, key: &str) -> StoreResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn remove_expired(&self) -> StoreResult<usize> {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<WindowEntry>> {
        let now = self.clock.now();
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix) && !entry.is_expired(now))
            .map(|entry| entry.value().clone())
            .collect())
    }
}
