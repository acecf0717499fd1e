//! Admission control inspection and maintenance

use crate::core::rate_limiter::{AdmissionController, StoreError};
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use std::sync::Arc;

/// Configure rate limit routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rate-limits")
            .route("/stats", web::get().to(stats))
            .route("/cleanup", web::post().to(cleanup))
            .route("/{policy}/keys/{key:.*}", web::get().to(key_status))
            .route("/{policy}/keys/{key:.*}", web::delete().to(reset_key)),
    );
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    top: Option<usize>,
}

fn store_error(e: StoreError) -> GatewayError {
    GatewayError::internal(format!("Rate limit store error: {}", e))
}

fn controller(state: &AppState, policy: &str) -> Result<Arc<AdmissionController>> {
    state
        .limiter(policy)
        .ok_or_else(|| GatewayError::not_found(format!("Unknown rate limit policy: {}", policy)))
}

/// Top consumers per policy
async fn stats(state: web::Data<AppState>, query: web::Query<StatsQuery>) -> Result<HttpResponse> {
    let top = query
        .top
        .unwrap_or(state.config().rate_limit().top_consumers);
    let stats = state.limiters.get_stats(top).map_err(store_error)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

/// Usage of one derived key, e.g. `ip:1.2.3.4`
async fn key_status(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (policy, key) = path.into_inner();
    let status = controller(&state, &policy)?
        .get_status(&key)
        .map_err(store_error)?
        .ok_or_else(|| GatewayError::not_found(format!("No active window for key: {}", key)))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(status)))
}

async fn reset_key(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (policy, key) = path.into_inner();
    let removed = controller(&state, &policy)?
        .reset(&key)
        .map_err(store_error)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "policy": policy,
        "key": key,
        "reset": removed,
    }))))
}

async fn cleanup(state: web::Data<AppState>) -> Result<HttpResponse> {
    let removed = state.limiters.cleanup_expired().map_err(store_error)?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "removed": removed,
    }))))
}
