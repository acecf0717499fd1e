//! Logging utilities
//!
//! Subscriber setup and the structured event logger used by the admission
//! and webhook pipelines.

pub mod structured;
pub mod utils;

pub use structured::{LogEvent, Outcome};
pub use utils::init_logging;
