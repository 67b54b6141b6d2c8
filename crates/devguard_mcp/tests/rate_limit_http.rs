//! End-to-end: the HTTP transport's per-IP token bucket returns 429 with a
//! `retry_after_secs` once a client exceeds its rate.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use devguard_admission::AdmissionGate;
use devguard_mcp::config::ServerConfig;
use devguard_mcp::state::AppState;
use devguard_mcp::transport::http::{router, HttpState};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn http_state(rate: u32) -> HttpState {
    let config = ServerConfig {
        db_url: "sqlite::memory:".to_string(),
        audit_log_path: None,
        ..Default::default()
    };
    let app = AppState::new(config).await.unwrap();
    HttpState {
        app,
        admission: Arc::new(AdmissionGate::new(vec![], vec![], rate, 60, 100)),
    }
}

fn ping_request() -> Request<Body> {
    let remote: SocketAddr = "203.0.113.7:12345".parse().unwrap();
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"});
    let mut request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    request.extensions_mut().insert(axum::extract::ConnectInfo(remote));
    request
}

#[tokio::test]
async fn the_fourth_request_in_a_burst_of_three_is_rate_limited() {
    let state = http_state(3).await;
    let app = router(state);

    let mut statuses = Vec::new();
    let mut last_body = Value::Null;
    for _ in 0..4 {
        let response = app.clone().oneshot(ping_request()).await.unwrap();
        statuses.push(response.status());
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        last_body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    }

    assert_eq!(
        statuses,
        vec![StatusCode::OK, StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );
    assert!(last_body.get("retry_after_secs").is_some());
}
