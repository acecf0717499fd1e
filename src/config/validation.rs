//! Configuration validation

use super::models::*;
use tracing::debug;

/// Validation trait for configuration structures
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating gateway configuration");

        self.server.validate()?;
        self.rate_limit.validate()?;
        self.webhook.validate()?;

        debug!("Gateway configuration validation completed");
        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Server host cannot be empty".to_string());
        }

        if self.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err("Worker count must be greater than 0".to_string());
            }
        }

        if self.max_body_size == 0 {
            return Err("Max body size must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for RateLimitSettings {
    fn validate(&self) -> Result<(), String> {
        if self.cleanup_interval_secs == 0 {
            return Err("Rate limit cleanup interval must be greater than 0".to_string());
        }

        for (name, policy) in &self.policies {
            if name.trim().is_empty() {
                return Err("Rate limit policy name cannot be empty".to_string());
            }
            policy
                .validate()
                .map_err(|e| format!("Rate limit policy '{}': {}", name, e))?;
        }

        Ok(())
    }
}

impl Validate for PolicyConfig {
    fn validate(&self) -> Result<(), String> {
        if self.window_ms == 0 {
            return Err("window_ms must be greater than 0".to_string());
        }

        if self.max_requests == 0 {
            return Err("max_requests must be greater than 0".to_string());
        }

        if !(400..=599).contains(&self.status_code) {
            return Err(format!(
                "status_code must be an HTTP error status, got {}",
                self.status_code
            ));
        }

        Ok(())
    }
}

impl Validate for WebhookSettings {
    fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("Webhook timeout must be greater than 0".to_string());
        }

        if self.max_pending_per_destination == 0 {
            return Err("Webhook pending queue bound must be greater than 0".to_string());
        }

        if self.redrive_batch_size == 0 {
            return Err("Webhook redrive batch size must be greater than 0".to_string());
        }

        if self.sweep_interval_ms == 0 {
            return Err("Webhook sweep interval must be greater than 0".to_string());
        }

        // 2^max_retries must stay representable
        if self.max_retries > 16 {
            return Err(format!(
                "Webhook max_retries must be at most 16, got {}",
                self.max_retries
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err("Webhook user agent cannot be empty".to_string());
        }

        Ok(())
    }
}
