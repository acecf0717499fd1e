//! Server entry point
//!
//! Loads configuration, initialises logging and runs the HTTP server until it
//! is shut down.

use crate::config::{Config, ConfigSource};
use crate::server::server::HttpServer;
use crate::utils::error::Result;
use crate::utils::logging::init_logging;
use std::path::Path;
use tracing::{info, warn};

/// Command-line overrides applied on top of file and environment settings
#[derive(Debug, Clone, Default)]
pub struct ServerOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Run the server with automatic configuration loading
pub async fn run_server(config_path: Option<&Path>, overrides: ServerOverrides) -> Result<()> {
    let mut config = Config::load(config_path).await?;
    if let Some(host) = overrides.host {
        config.gateway.server.host = host;
    }
    if let Some(port) = overrides.port {
        config.gateway.server.port = port;
    }
    config.validate()?;

    init_logging(config.logging())?;

    info!("Starting wa-gateway {}", env!("CARGO_PKG_VERSION"));
    match config.source() {
        ConfigSource::File(path) => info!("Configuration loaded from {:?}", path),
        ConfigSource::Missing(path) => warn!("Config file {:?} not found, using defaults", path),
        ConfigSource::Defaults => info!("No config file given, using defaults"),
    }
    info!(
        policies = ?config.rate_limit().policies.keys().collect::<Vec<_>>(),
        enabled = config.rate_limit().enabled,
        "Rate limiting"
    );
    info!(
        timeout_ms = config.webhook().timeout_ms,
        max_retries = config.webhook().max_retries,
        base_retry_delay_ms = config.webhook().base_retry_delay_ms,
        "Webhook delivery"
    );

    let server = HttpServer::new(&config)?;
    info!("Server starting at: http://{}", config.server().address());

    server.start().await
}
