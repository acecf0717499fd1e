//! Configuration loading from files

use std::io::Write;
use tempfile::NamedTempFile;
use wa_gateway::config::{Config, KeyRuleConfig};

#[tokio::test]
async fn test_partial_file_keeps_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
server:
  port: 9090
rate_limit:
  policies:
    messaging:
      window_ms: 1000
      max_requests: 3
      key: "header:x-tenant"
webhook:
  max_retries: 5
"#
    )
    .unwrap();

    let config = crate::assert_ok!(Config::from_file(file.path()).await);
    assert_eq!(config.server().port, 9090);
    assert_eq!(config.server().host, "0.0.0.0");
    assert_eq!(config.webhook().max_retries, 5);
    assert_eq!(config.webhook().base_retry_delay_ms, 2_000);

    let messaging = &config.rate_limit().policies["messaging"];
    assert_eq!(messaging.max_requests, 3);
    assert_eq!(messaging.key, KeyRuleConfig::Header("x-tenant".to_string()));
}

#[tokio::test]
async fn test_invalid_policy_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
rate_limit:
  policies:
    ip:
      window_ms: 0
      max_requests: 10
"#
    )
    .unwrap();

    let err = Config::from_file(file.path()).await.unwrap_err();
    assert!(err.to_string().contains("ip"));
}

#[tokio::test]
async fn test_missing_file_is_an_error() {
    assert!(Config::from_file("/nonexistent/gateway.yaml").await.is_err());
}
