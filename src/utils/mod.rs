//! Utility modules for the gateway
//!
//! - **error**: crate-wide error type and its HTTP mapping
//! - **logging**: subscriber setup and structured event logging

pub mod error;
pub mod logging;
