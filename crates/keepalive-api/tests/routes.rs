//! Route contract tests for the status surface.

use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{TimeZone, Utc};
use tower::ServiceExt;

use keepalive_api::build_router;
use keepalive_state::*;

fn roster() -> Vec<Target> {
    vec![
        Target::new("https://bot.example/healthz", Duration::from_secs(300)),
        Target::new("https://flow.example/healthz/readiness", Duration::from_secs(3600))
            .with_restart("owner/flow"),
    ]
}

async fn seeded_ledger() -> StatusLedger {
    let ledger = StatusLedger::new();
    ledger.register(&roster()).await;
    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    ledger
        .update("https://bot.example/healthz", |r| r.observe(Outcome::Ok, 2, at))
        .await;
    for _ in 0..3 {
        ledger
            .update("https://flow.example/healthz/readiness", |r| {
                r.observe(Outcome::Failed, 3, at)
            })
            .await;
    }
    ledger
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec();
    (status, content_type, body)
}

#[tokio::test]
async fn healthz_is_plain_ok() {
    let router = build_router(StatusLedger::new(), ProcessState::started_now(), roster());
    let (status, content_type, body) = get(router, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn healthz_ignores_failing_targets() {
    let router = build_router(seeded_ledger().await, ProcessState::started_now(), roster());
    let (status, _, body) = get(router, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn status_reports_every_worker() {
    let router = build_router(seeded_ledger().await, ProcessState::started_now(), roster());
    let (status, content_type, body) = get(router, "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("application/json"));

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "online");
    assert!(json["uptime_seconds"].is_u64());

    let bot = &json["workers"]["https://bot.example/healthz"];
    assert_eq!(bot["status"], "ok");
    assert_eq!(bot["attempts"], 2);
    assert_eq!(bot["consecutive_failures"], 0);
    assert_eq!(bot["last_ping"], "2023-11-14T22:13:20Z");
    assert_eq!(bot["total_restarts"], 0);
    assert!(bot.get("last_restart_time").is_none());

    let flow = &json["workers"]["https://flow.example/healthz/readiness"];
    assert_eq!(flow["status"], "failed");
    assert_eq!(flow["attempts"], 3);
    assert_eq!(flow["consecutive_failures"], 3);
}

#[tokio::test]
async fn status_is_stable_without_ticks() {
    let router = build_router(seeded_ledger().await, ProcessState::started_now(), roster());

    let (_, _, first) = get(router.clone(), "/status").await;
    let (_, _, second) = get(router, "/status").await;

    let first: serde_json::Value = serde_json::from_slice(&first).unwrap();
    let second: serde_json::Value = serde_json::from_slice(&second).unwrap();
    assert_eq!(first["workers"], second["workers"]);
    assert_eq!(first["status"], second["status"]);
}

#[tokio::test]
async fn status_before_first_tick_shows_unknown() {
    let ledger = StatusLedger::new();
    ledger.register(&roster()).await;
    let router = build_router(ledger, ProcessState::started_now(), roster());
    let (_, _, body) = get(router, "/status").await;

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let bot = &json["workers"]["https://bot.example/healthz"];
    assert_eq!(bot["status"], "unknown");
    assert!(bot.get("last_ping").is_none());
}

#[tokio::test]
async fn dashboard_renders_at_root() {
    let router = build_router(seeded_ledger().await, ProcessState::started_now(), roster());
    let (status, content_type, body) = get(router, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("keepalive"));
    assert!(html.contains("flow.example"));
}
