//! Error handling for the gateway
//!
//! This module defines the error types used throughout the gateway.

mod helpers;
mod response;
mod types;

pub use response::{ErrorDetail, ErrorResponse};
pub use types::{GatewayError, Result};
