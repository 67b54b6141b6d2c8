//! End-to-end: open an SSE stream, learn its session endpoint from the first
//! `endpoint` event, post a `tools/list` call to it, and read the matching
//! JSON-RPC response back off the same stream.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use devguard_admission::AdmissionGate;
use devguard_mcp::config::ServerConfig;
use devguard_mcp::state::AppState;
use devguard_mcp::transport::sse::{router, SseState};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn sse_state() -> SseState {
    let config = ServerConfig {
        db_url: "sqlite::memory:".to_string(),
        audit_log_path: None,
        ..Default::default()
    };
    let app = AppState::new(config).await.unwrap();
    SseState::new(app, Arc::new(AdmissionGate::new(vec![], vec![], 1000, 60, 100)))
}

fn with_remote(mut request: Request<Body>) -> Request<Body> {
    let remote: SocketAddr = "203.0.113.9:4242".parse().unwrap();
    request.extensions_mut().insert(axum::extract::ConnectInfo(remote));
    request
}

/// Reads chunks off `stream` until the buffer holds at least one complete
/// `\n\n`-terminated SSE event, then returns that event's text and the
/// remaining unconsumed buffer.
async fn read_one_event(
    stream: &mut (impl futures::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin),
    mut buffer: String,
) -> (String, String) {
    loop {
        if let Some(pos) = buffer.find("\n\n") {
            let rest = buffer.split_off(pos + 2);
            return (buffer, rest);
        }
        let chunk = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("event arrived before timeout")
            .expect("stream did not end")
            .unwrap();
        buffer.push_str(std::str::from_utf8(&chunk).unwrap());
    }
}

fn data_line(event_text: &str) -> &str {
    event_text
        .lines()
        .find_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .expect("event carries a data: line")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sse_session_round_trips_a_tools_list_call() {
    let state = sse_state().await;
    let app = router(state);

    let open = with_remote(Request::builder().method("GET").uri("/sse").body(Body::empty()).unwrap());
    let response = app.clone().oneshot(open).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body().into_data_stream();
    let (endpoint_event, leftover) = read_one_event(&mut body, String::new()).await;
    assert!(endpoint_event.contains("event:endpoint") || endpoint_event.contains("event: endpoint"));
    let endpoint = data_line(&endpoint_event);
    assert!(endpoint.starts_with("/sse?session_id="));

    let call = json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"});
    let post = with_remote(
        Request::builder()
            .method("POST")
            .uri(endpoint)
            .header("content-type", "application/json")
            .body(Body::from(call.to_string()))
            .unwrap(),
    );
    let post_response = app.clone().oneshot(post).await.unwrap();
    assert_eq!(post_response.status(), StatusCode::ACCEPTED);

    let (message_event, _) = read_one_event(&mut body, leftover).await;
    assert!(message_event.contains("event:message") || message_event.contains("event: message"));
    let payload: Value = serde_json::from_str(data_line(&message_event)).unwrap();
    assert_eq!(payload["id"], 7);
    let tools = payload["result"]["tools"].as_array().expect("tools array");
    assert!(tools.len() >= 35, "expected at least 35 registered tools, got {}", tools.len());
}
