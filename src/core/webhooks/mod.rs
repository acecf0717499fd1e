//! Webhook delivery pipeline
//!
//! Attempt executor, exponential backoff, and a bounded per-destination
//! pending queue that a shared sweeper redrives while the destination's
//! session is connected.

mod delivery;
pub mod events;
mod manager;
mod pending;
mod retry;
mod types;

pub use delivery::{ATTEMPT_HEADER, SESSION_HEADER, SIGNATURE_HEADER, sign_payload};
pub use events::WebhookEventType;
pub use manager::WebhookService;
pub use retry::{next_retry, retry_delay};
pub use types::{
    DeliveryError, DeliveryOutcome, DeliveryResponse, DestinationStats, PendingDelivery,
    SendOptions, SweepReport,
};
