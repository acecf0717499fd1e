//! Configuration management for the Gateway
//!
//! This module handles loading, validation, and management of all gateway configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{GatewayError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the file layer of a [`Config`] came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file
    File(PathBuf),
    /// Built-in defaults, no file requested
    #[default]
    Defaults,
    /// Built-in defaults because the requested file does not exist
    Missing(PathBuf),
}

/// Main configuration struct for the Gateway
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Gateway configuration
    pub gateway: GatewayConfig,
    source: ConfigSource,
}

impl Config {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path).await?;
        let gateway: GatewayConfig = serde_yaml::from_str(&content)?;

        let config = Self {
            gateway,
            source: ConfigSource::File(path.to_path_buf()),
        };
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Resolve the effective configuration: `.env`, then the file (defaults
    /// when it does not exist), then environment overrides.
    ///
    /// Nothing is logged here since the subscriber is installed from the
    /// result; report [`Config::source`] afterwards.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        // A missing .env file is normal
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path).await?,
            Some(path) => Self {
                source: ConfigSource::Missing(path.to_path_buf()),
                ..Self::default()
            },
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gateway = &mut self.gateway;

        if let Some(host) = lookup("GATEWAY_HOST") {
            gateway.server.host = host;
        }
        if let Some(port) = lookup("GATEWAY_PORT") {
            gateway.server.port = parse_env("GATEWAY_PORT", &port)?;
        }
        if let Some(level) = lookup("GATEWAY_LOG_LEVEL") {
            gateway.logging.level = level.parse().map_err(GatewayError::Config)?;
        }
        if let Some(json) = lookup("GATEWAY_LOG_JSON") {
            gateway.logging.json = parse_env("GATEWAY_LOG_JSON", &json)?;
        }
        if let Some(enabled) = lookup("RATE_LIMIT_ENABLED") {
            gateway.rate_limit.enabled = parse_env("RATE_LIMIT_ENABLED", &enabled)?;
        }
        if let Some(timeout) = lookup("WEBHOOK_TIMEOUT_MS") {
            gateway.webhook.timeout_ms = parse_env("WEBHOOK_TIMEOUT_MS", &timeout)?;
        }
        if let Some(retries) = lookup("WEBHOOK_MAX_RETRIES") {
            gateway.webhook.max_retries = parse_env("WEBHOOK_MAX_RETRIES", &retries)?;
        }
        if let Some(delay) = lookup("WEBHOOK_RETRY_DELAY_MS") {
            gateway.webhook.base_retry_delay_ms = parse_env("WEBHOOK_RETRY_DELAY_MS", &delay)?;
        }

        Ok(())
    }

    /// Where the file layer came from
    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Get server configuration
    pub fn server(&self) -> &ServerConfig {
        &self.gateway.server
    }

    /// Get logging configuration
    pub fn logging(&self) -> &LoggingConfig {
        &self.gateway.logging
    }

    /// Get rate limiting configuration
    pub fn rate_limit(&self) -> &RateLimitSettings {
        &self.gateway.rate_limit
    }

    /// Get webhook configuration
    pub fn webhook(&self) -> &WebhookSettings {
        &self.gateway.webhook
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.gateway
            .server
            .validate()
            .map_err(|e| GatewayError::Config(format!("Server config error: {}", e)))?;

        self.gateway
            .rate_limit
            .validate()
            .map_err(|e| GatewayError::Config(format!("Rate limit config error: {}", e)))?;

        self.gateway
            .webhook
            .validate()
            .map_err(|e| GatewayError::Config(format!("Webhook config error: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.gateway)?)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| GatewayError::Config(format!("Invalid value for {}: {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_config_from_file() {
        let config_content = r#"
server:
  host: "127.0.0.1"
  port: 8080
  workers: 4

logging:
  level: debug
  json: true

rate_limit:
  policies:
    ip:
      window_ms: 1000
      max_requests: 3
      legacy_headers: true

webhook:
  max_retries: 2
  base_retry_delay_ms: 50
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = Config::from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.server().host, "127.0.0.1");
        assert_eq!(config.server().port, 8080);
        assert_eq!(config.logging().level, LogLevel::Debug);
        assert!(config.logging().json);
        assert_eq!(config.rate_limit().policies.len(), 1);
        assert!(config.rate_limit().policies["ip"].legacy_headers);
        assert_eq!(config.webhook().max_retries, 2);
        assert_eq!(config.webhook().timeout_ms, 10_000);
    }

    #[tokio::test]
    async fn test_invalid_file_is_a_config_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"rate_limit:\n  policies:\n    ip:\n      window_ms: 0\n      max_requests: 1\n")
            .unwrap();

        let err = Config::from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        let config = Config::load(Some(&missing)).await.unwrap();
        assert_eq!(config.rate_limit().policies.len(), 5);
        assert_eq!(config.source(), &ConfigSource::Missing(missing));
    }

    #[tokio::test]
    async fn test_file_source_is_recorded() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"server:\n  port: 8081\n").unwrap();

        let config = Config::from_file(temp_file.path()).await.unwrap();
        assert_eq!(
            config.source(),
            &ConfigSource::File(temp_file.path().to_path_buf())
        );
        assert_eq!(Config::default().source(), &ConfigSource::Defaults);
    }

    #[tokio::test]
    async fn test_unreadable_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("absent.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Io(_)));

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"server: [").unwrap();
        let err = Config::from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Yaml(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GATEWAY_PORT", "9001"),
            ("GATEWAY_LOG_LEVEL", "warn"),
            ("RATE_LIMIT_ENABLED", "false"),
            ("WEBHOOK_MAX_RETRIES", "5"),
            ("WEBHOOK_RETRY_DELAY_MS", "250"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server().port, 9001);
        assert_eq!(config.logging().level, LogLevel::Warn);
        assert!(!config.rate_limit().enabled);
        assert_eq!(config.webhook().max_retries, 5);
        assert_eq!(config.webhook().base_retry_delay_ms, 250);
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "GATEWAY_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("GATEWAY_PORT"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(!config.to_yaml().unwrap().is_empty());
    }
}
