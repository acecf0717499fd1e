//! HTTP server core implementation
//!
//! This module provides the HttpServer struct and its core methods.

use crate::config::{Config, ServerConfig};
use crate::core::rate_limiter::spawn_cleanup_task;
use crate::server::middleware::{RateLimitMiddleware, RequestIdMiddleware};
use crate::server::routes;
use crate::server::state::AppState;
use crate::utils::error::{GatewayError, Result};
use actix_web::{
    App, HttpServer as ActixHttpServer,
    middleware::DefaultHeaders,
    web,
};
use std::time::Duration;
use tracing::info;
use tracing_actix_web::TracingLogger;

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let state = AppState::new(config.clone())?;

        Ok(Self {
            config: config.gateway.server.clone(),
            state,
        })
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();

        info!("Starting HTTP server on {}", bind_addr);

        let settings = self.state.config().rate_limit();
        let cleanup = settings.enabled.then(|| {
            spawn_cleanup_task(
                self.state.limiters.store().clone(),
                Duration::from_secs(settings.cleanup_interval_secs),
            )
        });
        let sweeper = self.state.webhooks.start_sweeper();

        let state = self.state.clone();
        let mut server = ActixHttpServer::new(move || create_app(state.clone()));
        if let Some(workers) = self.config.workers {
            server = server.workers(workers);
        }

        let server = server
            .bind(&bind_addr)
            .map_err(|e| GatewayError::server(format!("Failed to bind {}: {}", bind_addr, e)))?
            .run();

        info!("HTTP server listening on {}", bind_addr);

        let result = server
            .await
            .map_err(|e| GatewayError::server(format!("Server error: {}", e)));

        sweeper.abort();
        if let Some(cleanup) = cleanup {
            cleanup.abort();
        }

        info!("HTTP server stopped");
        result
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Create the Actix-web application
pub fn create_app(
    state: AppState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let json_config = web::JsonConfig::default()
        .limit(state.config().server().max_body_size)
        .error_handler(|err, _req| GatewayError::bad_request(err.to_string()).into());
    let global_limit = RateLimitMiddleware::new(state.limiter("ip"));
    let limiters = state.limiters.clone();

    App::new()
        .app_data(web::Data::new(state))
        .app_data(json_config)
        .wrap(global_limit)
        .wrap(RequestIdMiddleware)
        .wrap(DefaultHeaders::new().add(("Server", "wa-gateway")))
        .wrap(TracingLogger::default())
        .configure(|cfg| routes::configure_routes(cfg, &limiters))
}
