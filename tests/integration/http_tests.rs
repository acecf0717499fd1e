//! HTTP surface tests through the actix-web test harness

use crate::common::{peer, test_config, wait_until, with_policy};
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};
use wa_gateway::config::{Config, KeyRuleConfig};
use wa_gateway::server::{AppState, create_app};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn header<'a, B>(resp: &'a ServiceResponse<B>, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|value| value.to_str().ok())
}

fn state(config: Config) -> AppState {
    AppState::new(config).expect("state builds")
}

#[actix_web::test]
async fn test_global_ip_limit_denies_with_headers() {
    let mut config = with_policy(test_config(), "ip", 3, KeyRuleConfig::Ip);
    if let Some(policy) = config.gateway.rate_limit.policies.get_mut("ip") {
        policy.legacy_headers = true;
    }
    let app = test::init_service(create_app(state(config))).await;

    for expected_remaining in ["2", "1", "0"] {
        let req = test::TestRequest::get()
            .uri("/webhooks/stats")
            .peer_addr(peer("10.0.0.1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "ratelimit-limit"), Some("3"));
        assert_eq!(header(&resp, "ratelimit-remaining"), Some(expected_remaining));
        assert_eq!(header(&resp, "ratelimit-policy"), Some("3;w=60"));
        assert_eq!(header(&resp, "x-ratelimit-limit"), Some("3"));
    }

    let req = test::TestRequest::get()
        .uri("/webhooks/stats")
        .peer_addr(peer("10.0.0.1"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = header(&resp, "retry-after")
        .and_then(|value| value.parse().ok())
        .expect("retry-after header");
    assert!((1..=60).contains(&retry_after));
    assert_eq!(header(&resp, "ratelimit-remaining"), Some("0"));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
    assert_eq!(body["error"]["limit"], 3);
    assert_eq!(body["error"]["window_ms"], 60_000);
    assert_eq!(body["error"]["retry_after"], retry_after);

    // Other clients have their own window
    let req = test::TestRequest::get()
        .uri("/webhooks/stats")
        .peer_addr(peer("10.0.0.2"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_forwarded_for_identifies_client() {
    let config = with_policy(test_config(), "ip", 1, KeyRuleConfig::Ip);
    let app = test::init_service(create_app(state(config))).await;

    for client in ["203.0.113.7", "203.0.113.8"] {
        let req = test::TestRequest::get()
            .uri("/webhooks/stats")
            .insert_header(("x-forwarded-for", client))
            .peer_addr(peer("10.0.0.1"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let req = test::TestRequest::get()
        .uri("/webhooks/stats")
        .insert_header(("x-forwarded-for", "203.0.113.7"))
        .peer_addr(peer("10.0.0.1"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[actix_web::test]
async fn test_health_is_never_counted() {
    let config = with_policy(test_config(), "ip", 1, KeyRuleConfig::Ip);
    let app = test::init_service(create_app(state(config))).await;

    for _ in 0..5 {
        let req = test::TestRequest::get()
            .uri("/health")
            .peer_addr(peer("10.0.0.1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(header(&resp, "ratelimit-limit").is_none());
    }

    let first = test::TestRequest::get()
        .uri("/webhooks/stats")
        .peer_addr(peer("10.0.0.1"))
        .to_request();
    assert_eq!(test::call_service(&app, first).await.status(), StatusCode::OK);
    let second = test::TestRequest::get()
        .uri("/webhooks/stats")
        .peer_addr(peer("10.0.0.1"))
        .to_request();
    assert_eq!(
        test::call_service(&app, second).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[actix_web::test]
async fn test_auth_policy_only_counts_failures() {
    let app = test::init_service(create_app(state(test_config()))).await;

    for _ in 0..10 {
        let req = test::TestRequest::put()
            .uri("/sessions/s1")
            .peer_addr(peer("10.0.0.3"))
            .set_json(json!({ "webhook_delay_ms": 0 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    for _ in 0..5 {
        let req = test::TestRequest::delete()
            .uri("/sessions/unknown")
            .peer_addr(peer("10.0.0.3"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    let req = test::TestRequest::delete()
        .uri("/sessions/unknown")
        .peer_addr(peer("10.0.0.3"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["limit"], 5);
    assert_eq!(body["error"]["window_ms"], 900_000);
}

#[actix_web::test]
async fn test_messaging_limit_is_per_session() {
    let config = with_policy(test_config(), "messaging", 2, KeyRuleConfig::SessionAndIp);
    let app = test::init_service(create_app(state(config))).await;

    for session in ["a", "b"] {
        let req = test::TestRequest::put()
            .uri(&format!("/sessions/{}", session))
            .peer_addr(peer("10.0.0.4"))
            .set_json(json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let event = json!({ "event": "message", "data": { "text": "hi" } });
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/sessions/a/events")
            .peer_addr(peer("10.0.0.4"))
            .set_json(&event)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);
    }

    let req = test::TestRequest::post()
        .uri("/sessions/a/events")
        .peer_addr(peer("10.0.0.4"))
        .set_json(&event)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let req = test::TestRequest::post()
        .uri("/sessions/b/events")
        .peer_addr(peer("10.0.0.4"))
        .set_json(&event)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn test_disabled_rate_limiting_passes_everything() {
    let mut config = with_policy(test_config(), "ip", 1, KeyRuleConfig::Ip);
    config.gateway.rate_limit.enabled = false;
    let app = test::init_service(create_app(state(config))).await;

    for _ in 0..20 {
        let req = test::TestRequest::get()
            .uri("/webhooks/stats")
            .peer_addr(peer("10.0.0.5"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(header(&resp, "ratelimit-limit").is_none());
    }
}

#[actix_web::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = test::init_service(create_app(state(test_config()))).await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("x-request-id", "req-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(header(&resp, "x-request-id"), Some("req-123"));

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    let generated = header(&resp, "x-request-id").expect("generated request id");
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let app = test::init_service(create_app(state(test_config()))).await;

    let req = test::TestRequest::put()
        .uri("/sessions/s1")
        .peer_addr(peer("10.0.0.6"))
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[actix_web::test]
async fn test_rejects_non_http_webhook_url() {
    let app = test::init_service(create_app(state(test_config()))).await;

    let req = test::TestRequest::put()
        .uri("/sessions/s1")
        .peer_addr(peer("10.0.0.7"))
        .set_json(json!({ "webhook_url": "ftp://hooks.example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_events_reach_session_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let state = state(test_config());
    let app = test::init_service(create_app(state.clone())).await;

    let req = test::TestRequest::put()
        .uri("/sessions/s1")
        .peer_addr(peer("10.0.0.8"))
        .set_json(json!({ "webhook_url": format!("{}/hook", server.uri()) }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::put()
        .uri("/sessions/s1/connection")
        .peer_addr(peer("10.0.0.8"))
        .set_json(json!({ "connected": true }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/sessions/s1/events")
        .peer_addr(peer("10.0.0.8"))
        .set_json(json!({ "event": "message", "data": { "id": "m1" } }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);

    let webhooks = state.webhooks.clone();
    assert!(
        wait_until(|| {
            let webhooks = webhooks.clone();
            async move {
                webhooks
                    .get_stats("s1")
                    .await
                    .is_some_and(|stats| stats.total_success == 2)
            }
        })
        .await
    );

    let received = server.received_requests().await.unwrap_or_default();
    let events: Vec<String> = received
        .iter()
        .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
        .filter_map(|body| body["event"].as_str().map(str::to_string))
        .collect();
    assert!(events.contains(&"connection_update".to_string()));
    assert!(events.contains(&"message".to_string()));

    let req = test::TestRequest::get()
        .uri("/webhooks/s1/stats")
        .peer_addr(peer("10.0.0.8"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total_sent"], 2);
    assert_eq!(body["data"]["total_failed"], 0);
}

#[actix_web::test]
async fn test_failed_event_is_parked_and_clearable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = test_config();
    config.gateway.webhook.max_retries = 1;
    let state = state(config);
    let app = test::init_service(create_app(state.clone())).await;

    let req = test::TestRequest::put()
        .uri("/sessions/s1")
        .peer_addr(peer("10.0.0.9"))
        .set_json(json!({ "webhook_url": server.uri() }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/sessions/s1/events")
        .peer_addr(peer("10.0.0.9"))
        .set_json(json!({ "event": "message_status", "data": { "status": "read" } }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);

    let webhooks = state.webhooks.clone();
    assert!(
        wait_until(|| {
            let webhooks = webhooks.clone();
            async move { webhooks.get_pending_count("s1").await == 1 }
        })
        .await
    );

    let req = test::TestRequest::get()
        .uri("/webhooks/s1/pending")
        .peer_addr(peer("10.0.0.9"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["records"][0]["payload"]["event"], "message_status");

    let req = test::TestRequest::delete()
        .uri("/webhooks/s1/pending")
        .peer_addr(peer("10.0.0.9"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["cleared"], 1);
    assert_eq!(state.webhooks.get_pending_count("s1").await, 0);
}

#[actix_web::test]
async fn test_rate_limit_inspection_and_reset() {
    let app = test::init_service(create_app(state(test_config()))).await;

    for _ in 0..3 {
        let req = test::TestRequest::get()
            .uri("/webhooks/stats")
            .peer_addr(peer("10.0.0.10"))
            .to_request();
        test::call_service(&app, req).await;
    }

    // The inspection request itself is the fourth hit
    let req = test::TestRequest::get()
        .uri("/rate-limits/ip/keys/ip:10.0.0.10")
        .peer_addr(peer("10.0.0.10"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["count"], 4);
    assert_eq!(body["data"]["limit"], 100);

    let req = test::TestRequest::get()
        .uri("/rate-limits/stats?top=1")
        .peer_addr(peer("10.0.0.10"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let policies = body["data"].as_array().expect("stats list");
    let ip = policies
        .iter()
        .find(|stats| stats["policy"] == "ip")
        .expect("ip policy stats");
    assert_eq!(ip["top_consumers"][0]["key"], "ip:10.0.0.10");

    let req = test::TestRequest::delete()
        .uri("/rate-limits/ip/keys/ip:10.0.0.10")
        .peer_addr(peer("10.0.0.11"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["reset"], true);

    let req = test::TestRequest::get()
        .uri("/rate-limits/unknown/keys/ip:10.0.0.10")
        .peer_addr(peer("10.0.0.11"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}
