//! Admission control
//!
//! A process-local fixed-window counter store shared by any number of named
//! policies. Each [`AdmissionController`] owns one policy and namespaces its
//! keys with the policy name, so policies never see each other's counters.

mod limiter;
mod policy;
mod registry;
mod store;
mod types;
mod utils;


pub use limiter::{Admission, AdmissionController, CompletionHook};
pub use policy::{KeyRule, LimitCallback, RateLimitPolicy, ResponseShaping, SkipPredicate};
pub use registry::AdmissionRegistry;
pub use store::{MemoryWindowStore, StoreError, StoreResult, WindowStore};
pub use types::{
    ConsumerEntry, ConsumerStats, Decision, RateLimitInfo, RequestContext, RequestOutcome,
    WindowEntry,
};
pub use utils::spawn_cleanup_task;
