//! Admission control middleware
//!
//! Wraps a scope or resource with one named policy. Denied requests are
//! answered here; admitted requests get advisory `RateLimit-*` headers and,
//! when the policy exempts some outcomes, have their count taken back once the
//! response status is known.

use crate::core::rate_limiter::{
    AdmissionController, Decision, RateLimitInfo, RequestContext, RequestOutcome, ResponseShaping,
};
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::StatusCode;
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use actix_web::HttpResponse;
use futures::future::{Ready, ready};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

/// Header carrying the session id on routes without one in the path
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Rate limit middleware for Actix-web
///
/// Without a controller (rate limiting disabled or policy not configured)
/// every request passes through untouched.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    controller: Option<Arc<AdmissionController>>,
}

impl RateLimitMiddleware {
    pub fn new(controller: Option<Arc<AdmissionController>>) -> Self {
        Self { controller }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service,
            controller: self.controller.clone(),
        }))
    }
}

/// Service implementation for rate limit middleware
pub struct RateLimitMiddlewareService<S> {
    service: S,
    controller: Option<Arc<AdmissionController>>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(controller) = self.controller.clone() else {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        };

        let ctx = request_context(&req);
        let mut admission = controller.check(&ctx);
        let shaping = controller.policy().response.clone();
        let info = admission.info().cloned();

        if let Decision::Deny {
            retry_after_secs,
            limit,
            window_ms,
        } = *admission.decision()
        {
            let mut response = HttpResponse::build(
                StatusCode::from_u16(shaping.status_code).unwrap_or(StatusCode::TOO_MANY_REQUESTS),
            )
            .json(serde_json::json!({
                "error": {
                    "code": "RATE_LIMIT_EXCEEDED",
                    "message": shaping.message,
                    "retry_after": retry_after_secs,
                    "limit": limit,
                    "window_ms": window_ms,
                }
            }));

            let headers = response.headers_mut();
            if let Some(info) = &info {
                apply_headers(headers, &shaping, info);
            }
            insert_header(headers, RETRY_AFTER, retry_after_secs);

            return Box::pin(ready(Ok(req.into_response(response).map_into_right_body())));
        }

        let completion = admission.take_completion();
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;

            if let Some(hook) = completion {
                hook.complete(RequestOutcome::from_status(res.status().as_u16()));
            }
            if let Some(info) = &info {
                apply_headers(res.headers_mut(), &shaping, info);
            }

            Ok(res.map_into_left_body())
        })
    }
}

/// What the admission layer needs from an inbound request
pub fn request_context(req: &ServiceRequest) -> RequestContext {
    let mut ctx = RequestContext::new(req.method().as_str(), req.path());

    if let Some(ip) = client_ip(req) {
        ctx = ctx.with_ip(ip);
    }

    let session_id = req.match_info().get("id").map(str::to_string).or_else(|| {
        req.headers()
            .get(SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    });
    if let Some(session_id) = session_id {
        ctx = ctx.with_session(session_id);
    }

    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            ctx = ctx.with_header(name.as_str(), value);
        }
    }
    ctx
}

/// Forwarded client address when present, otherwise the peer address
fn client_ip(req: &ServiceRequest) -> Option<String> {
    let info = req.connection_info();
    let raw = info.realip_remote_addr()?;
    Some(match raw.parse::<SocketAddr>() {
        Ok(addr) => addr.ip().to_string(),
        Err(_) => raw.to_string(),
    })
}

fn apply_headers(headers: &mut HeaderMap, shaping: &ResponseShaping, info: &RateLimitInfo) {
    if shaping.headers {
        insert_header(headers, HeaderName::from_static("ratelimit-limit"), info.limit);
        insert_header(headers, HeaderName::from_static("ratelimit-remaining"), info.remaining);
        insert_header(headers, HeaderName::from_static("ratelimit-reset"), info.reset_after_secs);
        insert_header(
            headers,
            HeaderName::from_static("ratelimit-policy"),
            format!("{};w={}", info.limit, info.window_ms.div_ceil(1000)),
        );
    }
    if shaping.legacy_headers {
        insert_header(headers, HeaderName::from_static("x-ratelimit-limit"), info.limit);
        insert_header(headers, HeaderName::from_static("x-ratelimit-remaining"), info.remaining);
        insert_header(
            headers,
            HeaderName::from_static("x-ratelimit-reset"),
            info.reset_at.timestamp(),
        );
    }
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: impl ToString) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(name, value);
    }
}
