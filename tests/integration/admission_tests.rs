//! Admission control through the public API

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wa_gateway::core::ManualClock;
use wa_gateway::core::rate_limiter::{
    AdmissionController, AdmissionRegistry, Decision, KeyRule, MemoryWindowStore,
    RateLimitPolicy, RequestContext, RequestOutcome,
};

fn shared(clock: &ManualClock) -> (Arc<MemoryWindowStore>, Arc<ManualClock>) {
    let clock = Arc::new(clock.clone());
    (Arc::new(MemoryWindowStore::with_clock(clock.clone())), clock)
}

fn client(ip: &str) -> RequestContext {
    RequestContext::new("POST", "/sessions/s1/events")
        .with_ip(ip)
        .with_session("s1")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checks_admit_exactly_the_limit() {
    let controller = Arc::new(AdmissionController::new(
        RateLimitPolicy::new("ip", 60_000, 100),
        Arc::new(MemoryWindowStore::new()),
    ));
    let allowed = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let controller = controller.clone();
            let allowed = allowed.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    if controller.check(&client("10.1.1.1")).is_allowed() {
                        allowed.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(allowed.load(Ordering::SeqCst), 100);
}

#[test]
fn test_policies_share_store_without_interference() {
    let clock = ManualClock::default();
    let (store, clock) = shared(&clock);
    let mut registry = AdmissionRegistry::new(store.clone(), clock);
    let ip = registry.register(RateLimitPolicy::new("ip", 60_000, 2));
    let messaging = registry.register(
        RateLimitPolicy::new("messaging", 60_000, 5).with_key_rule(KeyRule::SessionAndIp),
    );

    for _ in 0..2 {
        assert!(ip.check(&client("10.2.2.2")).is_allowed());
    }
    assert!(!ip.check(&client("10.2.2.2")).is_allowed());

    // Same client, different policy
    assert!(messaging.check(&client("10.2.2.2")).is_allowed());
    assert_eq!(store.len(), 2);
}

#[test]
fn test_denied_client_recovers_after_window() {
    let clock = ManualClock::default();
    let (store, shared_clock) = shared(&clock);
    let controller =
        AdmissionController::with_clock(RateLimitPolicy::new("ip", 10_000, 1), store, shared_clock);

    assert!(controller.check(&client("10.3.3.3")).is_allowed());
    clock.advance_ms(2_500);
    match controller.check(&client("10.3.3.3")).decision() {
        Decision::Deny {
            retry_after_secs, ..
        } => assert_eq!(*retry_after_secs, 8),
        other => panic!("expected deny, got {:?}", other),
    }

    clock.advance_ms(7_500);
    assert!(controller.check(&client("10.3.3.3")).is_allowed());
}

#[test]
fn test_exempt_outcomes_do_not_consume_budget() {
    let clock = ManualClock::default();
    let (store, shared_clock) = shared(&clock);
    let controller = AdmissionController::with_clock(
        RateLimitPolicy::new("auth", 900_000, 2).skip_successful(true),
        store,
        shared_clock,
    );

    for _ in 0..10 {
        let mut admission = controller.check(&client("10.4.4.4"));
        assert!(admission.is_allowed());
        let hook = admission.take_completion().expect("completion hook");
        assert!(hook.complete(RequestOutcome::from_status(200)));
    }

    for _ in 0..2 {
        let mut admission = controller.check(&client("10.4.4.4"));
        assert!(admission.is_allowed());
        let hook = admission.take_completion().expect("completion hook");
        assert!(!hook.complete(RequestOutcome::from_status(401)));
    }
    assert!(!controller.check(&client("10.4.4.4")).is_allowed());
}
