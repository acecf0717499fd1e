//! Named admission controllers sharing one store

use super::limiter::AdmissionController;
use super::policy::RateLimitPolicy;
use super::store::{StoreResult, WindowStore};
use super::types::ConsumerStats;
use crate::config::models::rate_limit::RateLimitSettings;
use crate::core::clock::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Every configured policy, keyed by name
#[derive(Debug, Clone)]
pub struct AdmissionRegistry {
    store: Arc<dyn WindowStore>,
    clock: Arc<dyn Clock>,
    controllers: BTreeMap<String, Arc<AdmissionController>>,
}

impl AdmissionRegistry {
    pub fn new(store: Arc<dyn WindowStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            controllers: BTreeMap::new(),
        }
    }

    /// Build one controller per configured policy.
    ///
    /// A disabled section yields an empty registry, which admits everything.
    pub fn from_settings(
        settings: &RateLimitSettings,
        store: Arc<dyn WindowStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut registry = Self::new(store, clock);
        if !settings.enabled {
            info!("Rate limiting disabled");
            return registry;
        }

        for (name, config) in &settings.policies {
            registry.register(RateLimitPolicy::from_config(name, config));
        }
        info!(
            policies = ?registry.names(),
            "Rate limiting policies registered"
        );
        registry
    }

    /// Add or replace a policy
    pub fn register(&mut self, policy: RateLimitPolicy) -> Arc<AdmissionController> {
        let controller = Arc::new(AdmissionController::with_clock(
            policy,
            self.store.clone(),
            self.clock.clone(),
        ));
        self.controllers
            .insert(controller.name().to_string(), controller.clone());
        controller
    }

    pub fn get(&self, name: &str) -> Option<Arc<AdmissionController>> {
        self.controllers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.controllers.keys().map(String::as_str).collect()
    }

    pub fn store(&self) -> &Arc<dyn WindowStore> {
        &self.store
    }

    /// Remove expired windows across all policies
    pub fn cleanup_expired(&self) -> StoreResult<usize> {
        self.store.remove_expired()
    }

    /// Per-policy usage summaries
    pub fn get_stats(&self, top_n: usize) -> StoreResult<Vec<ConsumerStats>> {
        self.controllers
            .values()
            .map(|controller| controller.get_stats(top_n))
            .collect()
    }
}
