//! Rate limiter behaviour under concurrency.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use executive_api::config::RateLimitConfig;
use executive_api::middleware::{LocalRateLimiter, RateDecision};
use executive_integration_tests::{TestApp, test_config};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_burst_admits_exactly_capacity() {
    let limiter = Arc::new(LocalRateLimiter::new(10, 0.001, Duration::from_secs(600)));

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.allow("ip:203.0.113.1").await })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() == RateDecision::Allowed {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_keys_do_not_share_budget() {
    let limiter = Arc::new(LocalRateLimiter::new(3, 0.001, Duration::from_secs(600)));

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move {
                let key = format!("ip:198.51.100.{}", i % 2);
                (i % 2, limiter.allow(&key).await)
            })
        })
        .collect();

    let mut admitted = [0; 2];
    for handle in handles {
        let (slot, decision) = handle.await.unwrap();
        if decision == RateDecision::Allowed {
            admitted[slot] += 1;
        }
    }
    assert_eq!(admitted, [3, 3]);
}

#[tokio::test]
async fn test_denied_request_reports_wait() {
    let limiter = LocalRateLimiter::new(1, 0.5, Duration::from_secs(600));
    assert_eq!(limiter.allow("user:a").await, RateDecision::Allowed);
    match limiter.allow("user:a").await {
        RateDecision::Limited { retry_after } => {
            assert!(retry_after > Duration::from_millis(1500));
            assert!(retry_after <= Duration::from_secs(2));
        }
        RateDecision::Allowed => panic!("second request should be limited"),
    }
}

#[tokio::test]
async fn test_authenticated_clients_limited_per_user() {
    let mut config = test_config();
    config.rate_limit = RateLimitConfig {
        burst: 4,
        refill_per_second: 0.001,
        ..RateLimitConfig::default()
    };
    let app = TestApp::with_config(config);

    // Anonymous requests share the `ip:unknown` bucket: register + login use two.
    let token = app.sign_up("limited@example.com").await;

    let ok = app.call(Method::GET, "/api/v1/orders", Some(&token), None).await;
    assert_eq!(ok.status, StatusCode::OK);

    // The user's own bucket is independent of the anonymous one.
    for _ in 0..3 {
        let reply = app.call(Method::GET, "/api/v1/orders", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::OK);
    }
    let reply = app.call(Method::GET, "/api/v1/orders", Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::TOO_MANY_REQUESTS);

    let reply = app.call(Method::GET, "/api/v1/categories", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
}
