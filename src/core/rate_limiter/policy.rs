//! Rate limit policies

use super::types::{RateLimitInfo, RequestContext};
use crate::config::models::rate_limit::{KeyRuleConfig, PolicyConfig};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

/// Extra skip condition evaluated before any counting
pub type SkipPredicate = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

/// Called once for every denied request
pub type LimitCallback = Arc<dyn Fn(&RequestContext, &RateLimitInfo) + Send + Sync>;

/// How a request is mapped to a counter key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRule {
    /// Coarse network identifier of the client
    Ip,
    /// Session identifier alone
    Session,
    /// Session identifier scoped to the client network
    SessionAndIp,
    /// Value of a request header
    Header(String),
}

impl KeyRule {
    /// Derive the counter key, or `None` when the request lacks the data
    pub fn derive(&self, ctx: &RequestContext) -> Option<String> {
        match self {
            KeyRule::Ip => network_id(ctx).map(|net| format!("ip:{}", net)),
            KeyRule::Session => session_id(ctx).map(|id| format!("session:{}", id)),
            KeyRule::SessionAndIp => {
                let id = session_id(ctx)?;
                let net = network_id(ctx)?;
                Some(format!("session:{}:ip:{}", id, net))
            }
            KeyRule::Header(name) => ctx
                .header(name)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| format!("header:{}:{}", name.to_ascii_lowercase(), value)),
        }
    }
}

impl From<&KeyRuleConfig> for KeyRule {
    fn from(config: &KeyRuleConfig) -> Self {
        match config {
            KeyRuleConfig::Ip => KeyRule::Ip,
            KeyRuleConfig::Session => KeyRule::Session,
            KeyRuleConfig::SessionAndIp => KeyRule::SessionAndIp,
            KeyRuleConfig::Header(name) => KeyRule::Header(name.clone()),
        }
    }
}

fn session_id(ctx: &RequestContext) -> Option<&str> {
    ctx.session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// IPv4 addresses are used as-is; IPv6 clients are grouped by their /64
/// since a single host usually owns the whole prefix.
fn network_id(ctx: &RequestContext) -> Option<String> {
    let raw = ctx.ip.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }

    match raw.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => Some(v4.to_string()),
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => Some(v4.to_string()),
            None => {
                let s = v6.segments();
                Some(format!("{:x}:{:x}:{:x}:{:x}::/64", s[0], s[1], s[2], s[3]))
            }
        },
        // Unparseable peer strings (e.g. unix sockets) still identify the peer
        Err(_) => Some(raw.to_string()),
    }
}

/// Response shaping for a policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseShaping {
    /// Emit `RateLimit-*` headers
    pub headers: bool,
    /// Emit `X-RateLimit-*` headers
    pub legacy_headers: bool,
    pub status_code: u16,
    pub message: String,
}

impl Default for ResponseShaping {
    fn default() -> Self {
        Self {
            headers: true,
            legacy_headers: false,
            status_code: 429,
            message: "Too many requests, please try again later.".to_string(),
        }
    }
}

/// Immutable configuration of one admission controller
#[derive(Clone)]
pub struct RateLimitPolicy {
    pub name: String,
    pub window_ms: u64,
    pub max_requests: u32,
    pub key_rule: KeyRule,
    /// Path prefixes that are never counted
    pub skip_paths: Vec<String>,
    pub response: ResponseShaping,
    pub skip_successful_requests: bool,
    pub skip_failed_requests: bool,
    skip_when: Option<SkipPredicate>,
    on_limit: Option<LimitCallback>,
}

impl RateLimitPolicy {
    pub fn new(name: impl Into<String>, window_ms: u64, max_requests: u32) -> Self {
        Self {
            name: name.into(),
            window_ms,
            max_requests,
            key_rule: KeyRule::Ip,
            skip_paths: Vec::new(),
            response: ResponseShaping::default(),
            skip_successful_requests: false,
            skip_failed_requests: false,
            skip_when: None,
            on_limit: None,
        }
    }

    /// Build a policy from its config section
    pub fn from_config(name: &str, config: &PolicyConfig) -> Self {
        let mut policy = Self::new(name, config.window_ms, config.max_requests)
            .with_key_rule((&config.key).into())
            .with_response(ResponseShaping {
                headers: config.headers,
                legacy_headers: config.legacy_headers,
                status_code: config.status_code,
                message: config.message.clone(),
            });
        policy.skip_paths = config.skip_paths.clone();
        policy.skip_successful_requests = config.skip_successful_requests;
        policy.skip_failed_requests = config.skip_failed_requests;
        policy
    }

    pub fn with_key_rule(mut self, key_rule: KeyRule) -> Self {
        self.key_rule = key_rule;
        self
    }

    pub fn with_response(mut self, response: ResponseShaping) -> Self {
        self.response = response;
        self
    }

    pub fn skip_path(mut self, prefix: impl Into<String>) -> Self {
        self.skip_paths.push(prefix.into());
        self
    }

    pub fn skip_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        self.skip_when = Some(Arc::new(predicate));
        self
    }

    pub fn on_limit<F>(mut self, callback: F) -> Self
    where
        F: Fn(&RequestContext, &RateLimitInfo) + Send + Sync + 'static,
    {
        self.on_limit = Some(Arc::new(callback));
        self
    }

    pub fn skip_successful(mut self, skip: bool) -> Self {
        self.skip_successful_requests = skip;
        self
    }

    pub fn skip_failed(mut self, skip: bool) -> Self {
        self.skip_failed_requests = skip;
        self
    }

    /// Whether the request bypasses this policy entirely
    pub fn should_skip(&self, ctx: &RequestContext) -> bool {
        self.skip_paths
            .iter()
            .any(|prefix| ctx.path.starts_with(prefix.as_str()))
            || self.skip_when.as_ref().is_some_and(|skip| skip(ctx))
    }

    /// Whether admitted requests need a post-response decision
    pub fn needs_completion(&self) -> bool {
        self.skip_successful_requests || self.skip_failed_requests
    }

    pub(crate) fn notify_limited(&self, ctx: &RequestContext, info: &RateLimitInfo) {
        if let Some(callback) = &self.on_limit {
            callback(ctx, info);
        }
    }
}

impl fmt::Debug for RateLimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitPolicy")
            .field("name", &self.name)
            .field("window_ms", &self.window_ms)
            .field("max_requests", &self.max_requests)
            .field("key_rule", &self.key_rule)
            .field("skip_paths", &self.skip_paths)
            .field("response", &self.response)
            .field("skip_successful_requests", &self.skip_successful_requests)
            .field("skip_failed_requests", &self.skip_failed_requests)
            .field("skip_when", &self.skip_when.is_some())
            .field("on_limit", &self.on_limit.is_some())
            .finish()
    }
}
