//! Webhook delivery statistics and pending queues

use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{HttpResponse, web};

/// Configure webhook routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhooks")
            .route("/stats", web::get().to(all_stats))
            .route("/{id}/stats", web::get().to(session_stats))
            .route("/{id}/stats", web::delete().to(reset_stats))
            .route("/{id}/pending", web::get().to(pending))
            .route("/{id}/pending", web::delete().to(clear_pending)),
    );
}

async fn all_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let stats = state.webhooks.get_all_stats().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

async fn session_stats(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let session_id = path.into_inner();
    let stats = state
        .webhooks
        .get_stats(&session_id)
        .await
        .ok_or_else(|| GatewayError::not_found(format!("No webhook activity for session: {}", session_id)))?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

async fn reset_stats(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let session_id = path.into_inner();
    if !state.webhooks.reset_stats(&session_id).await {
        return Err(GatewayError::not_found(format!(
            "No webhook activity for session: {}",
            session_id
        )));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "session_id": session_id,
        "reset": true,
    }))))
}

async fn pending(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let session_id = path.into_inner();
    let records = state.webhooks.get_pending(&session_id).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "session_id": session_id,
        "count": records.len(),
        "records": records,
    }))))
}

async fn clear_pending(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let session_id = path.into_inner();
    let cleared = state.webhooks.clear_pending(&session_id).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "session_id": session_id,
        "cleared": cleared,
    }))))
}
