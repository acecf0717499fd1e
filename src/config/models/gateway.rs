//! Main gateway configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    /// Webhook delivery configuration
    #[serde(default)]
    pub webhook: WebhookSettings,
}
