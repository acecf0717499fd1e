//! Webhook delivery pipeline against live mock destinations

use crate::common::wait_until;
use serde_json::json;
use std::sync::Arc;
use wa_gateway::config::WebhookSettings;
use wa_gateway::core::webhooks::{SendOptions, WebhookService};
use wa_gateway::core::{InMemorySessionRegistry, SessionConfig};
use wiremock::matchers::{header_exists, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> WebhookSettings {
    WebhookSettings {
        base_retry_delay_ms: 1,
        timeout_ms: 2_000,
        ..WebhookSettings::default()
    }
}

fn service(url: &str) -> (WebhookService, Arc<InMemorySessionRegistry>) {
    let sessions = Arc::new(InMemorySessionRegistry::new());
    let config = SessionConfig {
        webhook_url: Some(url.to_string()),
        webhook_secret: Some("s3cret".to_string()),
        ..SessionConfig::default()
    };
    sessions.set_config("s1", config);
    let webhooks = WebhookService::new(settings(), sessions.clone()).expect("service builds");
    (webhooks, sessions)
}

#[tokio::test]
async fn test_outage_then_recovery_redelivers_everything() {
    let server = MockServer::start().await;
    let outage = Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount_as_scoped(&server)
        .await;

    let (webhooks, sessions) = service(&server.uri());
    for n in 0..3 {
        let outcome = webhooks
            .send("s1", json!({ "event": "message", "n": n }), SendOptions::default())
            .await;
        assert!(!outcome.success);
        assert!(outcome.will_retry);
    }

    let pending = webhooks.clone();
    assert!(
        wait_until(|| {
            let pending = pending.clone();
            async move { pending.get_pending_count("s1").await == 3 }
        })
        .await
    );

    // Still down and disconnected: nothing is attempted
    let report = webhooks.sweep_pending().await;
    assert_eq!(report.unreachable, 1);
    assert_eq!(webhooks.get_pending_count("s1").await, 3);

    drop(outage);
    Mock::given(method("POST"))
        .and(header_exists("x-webhook-signature"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    sessions.set_connected("s1", true);

    let report = webhooks.sweep_pending().await;
    assert_eq!(report.redelivered, 3);
    assert_eq!(webhooks.get_pending_count("s1").await, 0);

    let stats = webhooks.get_stats("s1").await.expect("stats");
    assert_eq!(stats.total_success, 3);
    assert_eq!(stats.total_failed, 12);
    assert!(stats.last_success_at.is_some());
}

#[tokio::test]
async fn test_redrive_preserves_enqueue_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (webhooks, sessions) = service(&server.uri());
    for n in 0..3 {
        webhooks
            .enqueue_pending("s1", json!({ "n": n }), "status 500".to_string())
            .await;
    }
    sessions.set_connected("s1", true);
    webhooks.sweep_pending().await;

    let received = server.received_requests().await.unwrap_or_default();
    let order: Vec<i64> = received
        .iter()
        .filter_map(|request| serde_json::from_slice::<serde_json::Value>(&request.body).ok())
        .filter_map(|body| body["n"].as_i64())
        .collect();
    assert_eq!(order, vec![0, 1, 2]);
}
