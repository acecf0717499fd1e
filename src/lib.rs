//! # wa-gateway
//!
//! REST facade over WhatsApp sessions. This crate holds the parts of the
//! gateway that sit between the HTTP surface and the protocol client:
//!
//! - **Admission control**: named fixed-window policies sharing one
//!   in-process counter store, applied as actix-web middleware
//! - **Webhook delivery**: per-session destinations with exponential
//!   backoff, a bounded pending queue and a periodic redrive sweeper
//!
//! ## Embedding
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wa_gateway::config::WebhookSettings;
//! use wa_gateway::core::session::{InMemorySessionRegistry, SessionConfig};
//! use wa_gateway::core::webhooks::{SendOptions, WebhookService, events};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sessions = Arc::new(InMemorySessionRegistry::new());
//!     sessions.set_config("main", SessionConfig::with_webhook("https://hooks.example.com/wa"));
//!
//!     let webhooks = WebhookService::new(WebhookSettings::default(), sessions)?;
//!     let _sweeper = webhooks.start_sweeper();
//!
//!     let payload = events::message("main", serde_json::json!({ "text": "hello" }));
//!     let outcome = webhooks.send("main", payload, SendOptions::default()).await;
//!     println!("delivered: {}", outcome.success);
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod server;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{GatewayError, Result};

/// Current version of the gateway
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the gateway
pub const NAME: &str = env!("CARGO_PKG_NAME");
