//! Session management and event intake
//!
//! Sessions here only carry what the webhook pipeline needs. Events posted
//! for a session are forwarded to its webhook in the background; the caller
//! gets `202 Accepted` immediately.

use crate::core::rate_limiter::AdmissionRegistry;
use crate::core::session::{SessionConfig, SessionRegistry};
use crate::core::webhooks::{SendOptions, WebhookEventType, events};
use crate::server::middleware::RateLimitMiddleware;
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

/// Configure session routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiters: &AdmissionRegistry) {
    cfg.service(
        web::resource("/sessions/{id}")
            .wrap(RateLimitMiddleware::new(limiters.get("auth")))
            .route(web::put().to(upsert_session))
            .route(web::delete().to(delete_session)),
    )
    .service(
        web::resource("/sessions/{id}/connection")
            .wrap(RateLimitMiddleware::new(limiters.get("session")))
            .route(web::put().to(set_connection)),
    )
    .service(
        web::resource("/sessions/{id}/events")
            .wrap(RateLimitMiddleware::new(limiters.get("messaging")))
            .route(web::post().to(post_event)),
    )
    .service(
        web::resource("/sessions/{id}/events/batch")
            .wrap(RateLimitMiddleware::new(limiters.get("upload")))
            .route(web::post().to(post_event_batch)),
    );
}

/// Body of `PUT /sessions/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRequest {
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub webhook_delay_ms: u64,
    pub webhook_secret: Option<String>,
}

/// Body of `PUT /sessions/{id}/connection`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub connected: bool,
}

/// One event to forward
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRequest {
    pub event: WebhookEventType,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Body of `POST /sessions/{id}/events/batch`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub events: Vec<EventRequest>,
}

#[derive(Debug, Serialize)]
struct SessionView {
    session_id: String,
    webhook_url: Option<String>,
    webhook_delay_ms: u64,
    signed: bool,
}

#[derive(Debug, Serialize)]
struct Accepted {
    session_id: String,
    accepted: usize,
}

/// Register or replace a session's webhook settings
async fn upsert_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SessionRequest>,
) -> Result<HttpResponse> {
    let session_id = path.into_inner();
    let body = body.into_inner();

    let webhook_url = match body.webhook_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Some(validate_webhook_url(url)?),
        _ => None,
    };

    let config = SessionConfig {
        webhook_url,
        webhook_delay_ms: body.webhook_delay_ms,
        webhook_secret: body.webhook_secret.filter(|secret| !secret.is_empty()),
    };
    let view = SessionView {
        session_id: session_id.clone(),
        webhook_url: config.webhook_url.clone(),
        webhook_delay_ms: config.webhook_delay_ms,
        signed: config.webhook_secret.is_some(),
    };

    state.sessions.set_config(&session_id, config);
    info!(session_id = %session_id, "Session configured");

    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

/// Forget a session; its pending webhooks stay until swept or cleared
async fn delete_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let session_id = path.into_inner();
    if !state.sessions.remove(&session_id) {
        return Err(GatewayError::not_found(format!("Session not found: {}", session_id)));
    }

    info!(session_id = %session_id, "Session removed");
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "session_id": session_id,
        "deleted": true,
    }))))
}

/// Record the session's connection state and notify its webhook
async fn set_connection(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ConnectionRequest>,
) -> Result<HttpResponse> {
    let session_id = path.into_inner();
    ensure_session(&state, &session_id)?;

    let connected = body.connected;
    let was_connected = state.sessions.is_connected(&session_id).await;
    state.sessions.set_connected(&session_id, connected);

    if was_connected != connected {
        let payload = events::connection_update(&session_id, connected);
        forward(&state, &session_id, vec![payload]);
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "session_id": session_id,
        "connected": connected,
    }))))
}

/// Forward one event
async fn post_event(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<EventRequest>,
) -> Result<HttpResponse> {
    let session_id = path.into_inner();
    ensure_session(&state, &session_id)?;

    let EventRequest { event, data } = body.into_inner();
    forward(&state, &session_id, vec![events::envelope(&session_id, event, data)]);

    Ok(HttpResponse::Accepted().json(ApiResponse::success(Accepted {
        session_id,
        accepted: 1,
    })))
}

/// Forward several events in order, paced by the session's webhook delay
async fn post_event_batch(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<BatchRequest>,
) -> Result<HttpResponse> {
    let session_id = path.into_inner();
    ensure_session(&state, &session_id)?;

    let batch = body.into_inner();
    if batch.events.is_empty() {
        return Err(GatewayError::bad_request("Batch must contain at least one event"));
    }

    let payloads: Vec<serde_json::Value> = batch
        .events
        .into_iter()
        .map(|request| events::envelope(&session_id, request.event, request.data))
        .collect();
    let accepted = payloads.len();
    forward(&state, &session_id, payloads);

    Ok(HttpResponse::Accepted().json(ApiResponse::success(Accepted {
        session_id,
        accepted,
    })))
}

fn ensure_session(state: &AppState, session_id: &str) -> Result<()> {
    if state.sessions.contains(session_id) {
        Ok(())
    } else {
        Err(GatewayError::not_found(format!("Session not found: {}", session_id)))
    }
}

/// Fire-and-forget delivery; outcomes only show up in logs and stats
fn forward(state: &AppState, session_id: &str, mut payloads: Vec<serde_json::Value>) {
    let webhooks = state.webhooks.clone();
    let session_id = session_id.to_string();

    tokio::spawn(async move {
        if payloads.len() == 1 {
            if let Some(payload) = payloads.pop() {
                webhooks.send(&session_id, payload, SendOptions::default()).await;
            }
        } else {
            webhooks.send_batch(&session_id, payloads).await;
        }
    });
}

/// Only absolute http(s) URLs with a host are accepted
fn validate_webhook_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw)
        .map_err(|e| GatewayError::validation(format!("Invalid webhook URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(GatewayError::validation(format!(
                "Webhook URL must use http:// or https://, got: {}",
                scheme
            )));
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(GatewayError::validation("Webhook URL must have a host"));
    }

    Ok(url.to_string())
}
