//! Rate limiting configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How requests are keyed for a policy.
///
/// Serialized as `ip`, `session`, `session_and_ip` or `header:<name>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyRuleConfig {
    #[default]
    Ip,
    Session,
    SessionAndIp,
    Header(String),
}

impl TryFrom<String> for KeyRuleConfig {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "ip" => Ok(KeyRuleConfig::Ip),
            "session" => Ok(KeyRuleConfig::Session),
            "session_and_ip" => Ok(KeyRuleConfig::SessionAndIp),
            other => match other.strip_prefix("header:") {
                Some(name) if !name.trim().is_empty() => {
                    Ok(KeyRuleConfig::Header(name.trim().to_string()))
                }
                _ => Err(format!("Unknown rate limit key rule: {}", other)),
            },
        }
    }
}

impl From<KeyRuleConfig> for String {
    fn from(rule: KeyRuleConfig) -> Self {
        rule.to_string()
    }
}

impl fmt::Display for KeyRuleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRuleConfig::Ip => write!(f, "ip"),
            KeyRuleConfig::Session => write!(f, "session"),
            KeyRuleConfig::SessionAndIp => write!(f, "session_and_ip"),
            KeyRuleConfig::Header(name) => write!(f, "header:{}", name),
        }
    }
}

/// One named admission policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Requests allowed per key and window
    pub max_requests: u32,
    #[serde(default)]
    pub key: KeyRuleConfig,
    /// Path prefixes never counted by this policy
    #[serde(default = "default_skip_paths")]
    pub skip_paths: Vec<String>,
    #[serde(default = "super::default_true")]
    pub headers: bool,
    #[serde(default)]
    pub legacy_headers: bool,
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default)]
    pub skip_successful_requests: bool,
    #[serde(default)]
    pub skip_failed_requests: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            max_requests: 100,
            key: KeyRuleConfig::Ip,
            skip_paths: default_skip_paths(),
            headers: true,
            legacy_headers: false,
            status_code: default_status_code(),
            message: default_message(),
            skip_successful_requests: false,
            skip_failed_requests: false,
        }
    }
}

impl PolicyConfig {
    fn preset(window_ms: u64, max_requests: u32, key: KeyRuleConfig) -> Self {
        Self {
            window_ms,
            max_requests,
            key,
            ..Self::default()
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Enable admission control
    #[serde(default = "super::default_true")]
    pub enabled: bool,
    /// Seconds between expired-entry sweeps
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
    /// Default size of the top-consumers report
    #[serde(default = "default_top_consumers")]
    pub top_consumers: usize,
    /// Named policies
    #[serde(default = "default_policies")]
    pub policies: BTreeMap<String, PolicyConfig>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cleanup_interval_secs: default_cleanup_interval(),
            top_consumers: default_top_consumers(),
            policies: default_policies(),
        }
    }
}

fn default_skip_paths() -> Vec<String> {
    vec!["/health".to_string()]
}

fn default_status_code() -> u16 {
    429
}

fn default_message() -> String {
    "Too many requests, please try again later.".to_string()
}

fn default_cleanup_interval() -> u64 {
    60
}

fn default_top_consumers() -> usize {
    10
}

/// The stock policy set: a global per-network limit, per-session limits and
/// stricter limits for session management and bulk sends.
pub fn default_policies() -> BTreeMap<String, PolicyConfig> {
    let mut policies = BTreeMap::new();
    policies.insert(
        "ip".to_string(),
        PolicyConfig::preset(60_000, 100, KeyRuleConfig::Ip),
    );
    policies.insert(
        "session".to_string(),
        PolicyConfig::preset(60_000, 30, KeyRuleConfig::SessionAndIp),
    );
    policies.insert(
        "auth".to_string(),
        PolicyConfig {
            skip_successful_requests: true,
            message: "Too many session management requests, please try again later.".to_string(),
            ..PolicyConfig::preset(15 * 60_000, 5, KeyRuleConfig::Ip)
        },
    );
    policies.insert(
        "upload".to_string(),
        PolicyConfig::preset(60_000, 10, KeyRuleConfig::SessionAndIp),
    );
    policies.insert(
        "messaging".to_string(),
        PolicyConfig::preset(60_000, 60, KeyRuleConfig::SessionAndIp),
    );
    policies
}
