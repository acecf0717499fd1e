//! HTTP middleware implementations
//!
//! - Admission control per named policy
//! - Request ID tracking

mod rate_limit;
mod request_id;


pub use rate_limit::{
    RateLimitMiddleware, RateLimitMiddlewareService, SESSION_ID_HEADER, request_context,
};
pub use request_id::{REQUEST_ID_HEADER, RequestIdMiddleware, RequestIdMiddlewareService};
