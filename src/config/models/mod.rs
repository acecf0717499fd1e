//! Configuration data models
//!
//! This module defines all configuration structures used throughout the gateway.

pub mod gateway;
pub mod logging;
pub mod rate_limit;
pub mod server;
pub mod webhook;

pub use gateway::*;
pub use logging::*;
pub use rate_limit::*;
pub use server::*;
pub use webhook::*;

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8000
}

pub(crate) fn default_true() -> bool {
    true
}
