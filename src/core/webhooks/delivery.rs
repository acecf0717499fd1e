//! Single delivery attempts
//!
//! One outbound POST per call. Every attempt updates the destination's
//! statistics, whatever the caller then does with the result.

use super::manager::WebhookService;
use super::types::{DeliveryError, DeliveryResponse, Destination, DestinationStats};
use crate::utils::error::{GatewayError, Result};
use crate::utils::logging::{LogEvent, Outcome};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, Instant};

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_HEADER: &str = "X-Webhook-Session";
pub const ATTEMPT_HEADER: &str = "X-Webhook-Attempt";
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Response bodies kept for logs and errors are cut to this many characters
const MAX_BODY_CHARS: usize = 512;

/// `sha256=<hex>` HMAC of `body` under `secret`
pub fn sign_payload(body: &[u8], secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| GatewayError::Crypto(e.to_string()))?;
    mac.update(body);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

impl WebhookService {
    /// Issue one POST to `destination`
    pub(super) async fn attempt(
        &self,
        destination: &Destination,
        payload: &serde_json::Value,
        retry_count: u32,
        timeout: Duration,
    ) -> std::result::Result<DeliveryResponse, DeliveryError> {
        let started = Instant::now();
        let result = self.post(destination, payload, retry_count, timeout).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.record_attempt(&destination.session_id, &result).await;

        match &result {
            Ok(response) => {
                LogEvent::new("webhook.attempt", Outcome::Success, destination.session_id.as_str())
                    .field("url", &destination.url)
                    .field("status", response.status)
                    .field("retry_count", retry_count)
                    .field("elapsed_ms", elapsed_ms)
                    .info();
            }
            Err(e) => {
                LogEvent::new("webhook.attempt", Outcome::Failure, destination.session_id.as_str())
                    .field("url", &destination.url)
                    .field("error_kind", e.kind())
                    .field("error", e.to_string())
                    .field("status", e.status())
                    .field("retry_count", retry_count)
                    .field("elapsed_ms", elapsed_ms)
                    .warn();
            }
        }

        result
    }

    async fn post(
        &self,
        destination: &Destination,
        payload: &serde_json::Value,
        retry_count: u32,
        timeout: Duration,
    ) -> std::result::Result<DeliveryResponse, DeliveryError> {
        let body = serde_json::to_vec(payload).map_err(|e| DeliveryError::Encoding(e.to_string()))?;

        let mut request = self
            .client
            .post(&destination.url)
            .timeout(timeout)
            .header("Content-Type", "application/json")
            .header(SESSION_HEADER, &destination.session_id)
            .header(ATTEMPT_HEADER, retry_count.to_string());

        if let Some(secret) = &destination.secret {
            let signature =
                sign_payload(&body, secret).map_err(|e| DeliveryError::Encoding(e.to_string()))?;
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.body(body).send().await.map_err(|e| {
            if e.is_timeout() {
                DeliveryError::Timeout(timeout.as_millis() as u64)
            } else {
                DeliveryError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(text) => truncate(text),
            Err(e) if e.is_timeout() => {
                return Err(DeliveryError::Timeout(timeout.as_millis() as u64));
            }
            Err(_) => String::new(),
        };

        if (200..300).contains(&status) {
            Ok(DeliveryResponse { status, body })
        } else {
            Err(DeliveryError::Rejected { status, body })
        }
    }

    async fn record_attempt(
        &self,
        session_id: &str,
        result: &std::result::Result<DeliveryResponse, DeliveryError>,
    ) {
        let mut data = self.data.write().await;
        let stats = data
            .stats
            .entry(session_id.to_string())
            .or_insert_with(|| DestinationStats::new(session_id));

        stats.total_sent += 1;
        match result {
            Ok(_) => {
                stats.total_success += 1;
                stats.last_success_at = Some(Utc::now());
            }
            Err(e) => {
                stats.total_failed += 1;
                stats.last_error_at = Some(Utc::now());
                stats.last_error = Some(e.to_string());
            }
        }
    }
}

fn truncate(mut text: String) -> String {
    if let Some((index, _)) = text.char_indices().nth(MAX_BODY_CHARS) {
        text.truncate(index);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_stable_hex() {
        let signature = sign_payload(br#"{"event":"message"}"#, "secret").unwrap();
        assert!(signature.starts_with("sha256="));
        assert_eq!(signature.len(), "sha256=".len() + 64);
        assert_eq!(
            signature,
            sign_payload(br#"{"event":"message"}"#, "secret").unwrap()
        );
        assert_ne!(
            signature,
            sign_payload(br#"{"event":"message"}"#, "other").unwrap()
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "é".repeat(MAX_BODY_CHARS + 10);
        assert_eq!(truncate(long).chars().count(), MAX_BODY_CHARS);
        assert_eq!(truncate("ok".to_string()), "ok");
    }

    #[test]
    fn test_delivery_error_status() {
        let rejected = DeliveryError::Rejected {
            status: 502,
            body: String::new(),
        };
        assert_eq!(rejected.status(), Some(502));
        assert_eq!(rejected.to_string(), "destination returned status 502");
        assert_eq!(DeliveryError::Timeout(10).status(), None);
        assert_eq!(DeliveryError::Timeout(10).kind(), "timeout");
    }
}
