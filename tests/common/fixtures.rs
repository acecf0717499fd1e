//! Test fixtures

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use wa_gateway::config::{Config, KeyRuleConfig, PolicyConfig};

/// Default configuration with webhook backoff shrunk to a millisecond
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.gateway.webhook.base_retry_delay_ms = 1;
    config.gateway.webhook.timeout_ms = 2_000;
    config
}

/// Replace one named policy with a tight limit
pub fn with_policy(mut config: Config, name: &str, max_requests: u32, key: KeyRuleConfig) -> Config {
    let base = config
        .gateway
        .rate_limit
        .policies
        .get(name)
        .cloned()
        .unwrap_or_default();
    config.gateway.rate_limit.policies.insert(
        name.to_string(),
        PolicyConfig {
            max_requests,
            key,
            ..base
        },
    );
    config
}

/// Peer address for test requests
pub fn peer(ip: &str) -> SocketAddr {
    SocketAddr::new(ip.parse().expect("valid test ip"), 40_000)
}

/// Poll `check` until it holds or two seconds pass
pub async fn wait_until<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
