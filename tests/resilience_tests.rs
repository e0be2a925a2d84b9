//! End-to-end resilience behavior: breaker, retry and cache seen through HTTP.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use fund_registry::{
    cache::{shared, CacheStore},
    create_router,
    resilience::{BreakerConfig, CircuitBreaker, RetryPolicy},
    store::{FlakyStore, MemoryStore, StoreError},
    AppState, Config,
};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    app: Router,
    store: Arc<FlakyStore<MemoryStore>>,
}

fn create_test_app(recovery: Duration, retry: RetryPolicy) -> TestApp {
    let config = Config::default();
    let store = Arc::new(FlakyStore::new(MemoryStore::new()));
    let breaker = Arc::new(CircuitBreaker::new(
        "database",
        BreakerConfig {
            failure_threshold: 2,
            recovery_timeout: recovery,
        },
    ));
    let cache = shared(CacheStore::new(100, Duration::from_secs(60)));
    let state = AppState::new(store.clone(), cache, breaker, retry);
    TestApp {
        app: create_router(state, &config),
        store,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, retry_after, serde_json::from_slice(&bytes).unwrap())
}

async fn post(app: &Router, uri: &str, body: Value) -> StatusCode {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_breaker_opens_and_rejects_with_retry_after() {
    let t = create_test_app(Duration::from_secs(30), RetryPolicy::none());
    t.store.go_down(StoreError::Connection("connection refused".into()));

    for _ in 0..2 {
        let (code, retry_after, json) = get(&t.app, "/api/v1/investors").await;
        assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
        assert!(retry_after.is_none());
        assert!(!json["message"].as_str().unwrap().contains("refused"));
    }
    let calls = t.store.calls();

    let (code, retry_after, json) = get(&t.app, "/api/v1/investors").await;
    assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], true);
    assert!(json["message"].as_str().unwrap().contains("is OPEN"));
    let secs: u64 = retry_after.unwrap().parse().unwrap();
    assert!((1..=30).contains(&secs));
    assert_eq!(t.store.calls(), calls);

    let (code, _, health) = get(&t.app, "/health").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["database"], false);
    assert_eq!(health["circuit_breaker"]["state"], "open");
}

#[tokio::test]
async fn test_cached_reads_survive_outage() {
    let t = create_test_app(Duration::from_secs(30), RetryPolicy::none());
    let created = post(
        &t.app,
        "/api/v1/funds",
        json!({ "name": "Cedar Growth", "vintage_year": 2021, "target_size_usd": 1.5e8 }),
    )
    .await;
    assert_eq!(created, StatusCode::CREATED);
    let (_, _, listed) = get(&t.app, "/api/v1/funds").await;

    t.store.go_down(StoreError::Timeout("statement timeout".into()));

    let (code, _, cached) = get(&t.app, "/api/v1/funds").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(cached, listed);

    let (code, _, _) = get(&t.app, "/api/v1/funds?limit=10").await;
    assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_constraint_errors_do_not_trip_breaker() {
    let t = create_test_app(Duration::from_secs(30), RetryPolicy::none());
    let body = json!({
        "name": "Jane Doe",
        "investor_type": "Individual",
        "email": "jane@doe.example",
    });
    assert_eq!(post(&t.app, "/api/v1/investors", body.clone()).await, StatusCode::CREATED);

    for _ in 0..5 {
        assert_eq!(post(&t.app, "/api/v1/investors", body.clone()).await, StatusCode::CONFLICT);
    }

    let (_, _, health) = get(&t.app, "/health").await;
    assert_eq!(health["circuit_breaker"]["state"], "closed");
    assert_eq!(health["circuit_breaker"]["failure_count"], 0);
}

#[tokio::test]
async fn test_breaker_recovers_after_timeout() {
    let t = create_test_app(Duration::from_millis(50), RetryPolicy::none());
    t.store.go_down(StoreError::Connection("down".into()));

    get(&t.app, "/api/v1/investors").await;
    get(&t.app, "/api/v1/investors").await;
    let (code, _, _) = get(&t.app, "/api/v1/investors").await;
    assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);

    t.store.recover();
    tokio::time::sleep(Duration::from_millis(80)).await;

    let (code, _, _) = get(&t.app, "/api/v1/investors").await;
    assert_eq!(code, StatusCode::OK);

    let (_, _, health) = get(&t.app, "/health").await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["circuit_breaker"]["state"], "closed");
}

#[tokio::test]
async fn test_transient_read_failures_are_retried() {
    let retry = RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        jitter: false,
    };
    let t = create_test_app(Duration::from_secs(30), retry);
    t.store.fail_next(2);

    let (code, _, json) = get(&t.app, "/api/v1/investors").await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(json, json!([]));
    assert_eq!(t.store.calls(), 3);
}
