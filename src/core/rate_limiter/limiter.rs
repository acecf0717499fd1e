//! Core admission controller implementation

use super::policy::RateLimitPolicy;
use super::store::WindowStore;
use super::types::{Decision, RateLimitInfo, RequestContext, RequestOutcome};
use crate::core::clock::{Clock, SystemClock};
use crate::utils::logging::{LogEvent, Outcome};
use std::sync::Arc;

const CHECK_EVENT: &str = "rate_limit.check";

/// Admission controller for one named policy
#[derive(Debug, Clone)]
pub struct AdmissionController {
    pub(super) policy: Arc<RateLimitPolicy>,
    pub(super) store: Arc<dyn WindowStore>,
    pub(super) clock: Arc<dyn Clock>,
}

/// Outcome of [`AdmissionController::check`]
#[derive(Debug)]
pub struct Admission {
    decision: Decision,
    info: Option<RateLimitInfo>,
    completion: Option<CompletionHook>,
}

impl Admission {
    /// Allowed without being counted
    fn unmetered() -> Self {
        Self {
            decision: Decision::Allow,
            info: None,
            completion: None,
        }
    }

    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    pub fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }

    /// Advisory counters; absent when the request was not counted
    pub fn info(&self) -> Option<&RateLimitInfo> {
        self.info.as_ref()
    }

    /// Deferred decrement to run once the response outcome is known
    pub fn take_completion(&mut self) -> Option<CompletionHook> {
        self.completion.take()
    }
}

/// Continuation returned for admitted requests whose policy exempts some
/// outcomes from the count.
///
/// Decrements the key by one at most; concurrent in-flight requests on the
/// same key are not tracked individually.
#[derive(Debug)]
pub struct CompletionHook {
    store: Arc<dyn WindowStore>,
    key: String,
    skip_successful: bool,
    skip_failed: bool,
}

impl CompletionHook {
    /// Apply the exemption for `outcome`; returns whether the count was taken back
    pub fn complete(self, outcome: RequestOutcome) -> bool {
        let exempt = if outcome.is_success() {
            self.skip_successful
        } else {
            self.skip_failed
        };
        if !exempt {
            return false;
        }

        match self.store.decrement(&self.key) {
            Ok(()) => true,
            Err(e) => {
                LogEvent::new(CHECK_EVENT, Outcome::Error, self.key.as_str())
                    .field("stage", "decrement")
                    .field("error", e.to_string())
                    .warn();
                false
            }
        }
    }
}

impl AdmissionController {
    pub fn new(policy: RateLimitPolicy, store: Arc<dyn WindowStore>) -> Self {
        Self::with_clock(policy, store, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(
        policy: RateLimitPolicy,
        store: Arc<dyn WindowStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy: Arc::new(policy),
            store,
            clock,
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    pub fn name(&self) -> &str {
        &self.policy.name
    }

    /// Store key for a derived key
    pub(super) fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.policy.name, key)
    }

    /// Decide whether `ctx` may proceed, counting it against its key.
    ///
    /// Never fails: skipped requests, requests without a usable key and
    /// store faults are all allowed.
    pub fn check(&self, ctx: &RequestContext) -> Admission {
        let policy = &self.policy;

        if policy.should_skip(ctx) {
            LogEvent::new(CHECK_EVENT, Outcome::Skipped, policy.name.as_str())
                .field("path", &ctx.path)
                .debug();
            return Admission::unmetered();
        }

        let Some(derived) = policy.key_rule.derive(ctx) else {
            LogEvent::new(CHECK_EVENT, Outcome::Skipped, policy.name.as_str())
                .field("reason", "no_key")
                .field("path", &ctx.path)
                .debug();
            return Admission::unmetered();
        };
        let key = self.namespaced(&derived);

        let entry = match self
            .store
            .increment(&key, policy.window_ms, policy.max_requests)
        {
            Ok(entry) => entry,
            Err(e) => {
                LogEvent::new(CHECK_EVENT, Outcome::Error, key.as_str())
                    .field("policy", &policy.name)
                    .field("error", e.to_string())
                    .field("path", &ctx.path)
                    .warn();
                return Admission::unmetered();
            }
        };

        let now = self.clock.now();
        let info = RateLimitInfo::from_entry(&entry, policy.max_requests, policy.window_ms, now);

        if entry.count > policy.max_requests {
            let retry_after_secs = entry.millis_until_reset(now).div_ceil(1000);
            policy.notify_limited(ctx, &info);

            LogEvent::new(CHECK_EVENT, Outcome::Denied, key.as_str())
                .field("policy", &policy.name)
                .field("count", entry.count)
                .field("limit", policy.max_requests)
                .field("window_ms", policy.window_ms)
                .field("retry_after_secs", retry_after_secs)
                .field("method", &ctx.method)
                .field("path", &ctx.path)
                .field("ip", &ctx.ip)
                .field("session_id", &ctx.session_id)
                .warn();

            return Admission {
                decision: Decision::Deny {
                    retry_after_secs,
                    limit: policy.max_requests,
                    window_ms: policy.window_ms,
                },
                info: Some(info),
                completion: None,
            };
        }

        LogEvent::new(CHECK_EVENT, Outcome::Allowed, key.as_str())
            .field("count", entry.count)
            .field("limit", policy.max_requests)
            .debug();

        let completion = policy.needs_completion().then(|| CompletionHook {
            store: self.store.clone(),
            key,
            skip_successful: policy.skip_successful_requests,
            skip_failed: policy.skip_failed_requests,
        });

        Admission {
            decision: Decision::Allow,
            info: Some(info),
            completion,
        }
    }
}
