//! HTTP route modules
//!
//! This module contains all HTTP route handlers organized by functionality.

pub mod health;
pub mod rate_limits;
pub mod sessions;
pub mod webhooks;

use crate::core::rate_limiter::AdmissionRegistry;
use actix_web::web;

/// Standard API response structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T>
where
    T: serde::Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Mount every route, wrapping each group in its admission policy
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiters: &AdmissionRegistry) {
    health::configure_routes(cfg);
    sessions::configure_routes(cfg, limiters);
    webhooks::configure_routes(cfg);
    rate_limits::configure_routes(cfg);
}
