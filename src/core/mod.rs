//! Core functionality for the gateway
//!
//! Admission control, webhook delivery and the collaborator interfaces they
//! depend on.

pub mod clock;
pub mod rate_limiter;
pub mod session;
pub mod webhooks;

pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{InMemorySessionRegistry, SessionConfig, SessionRegistry};
