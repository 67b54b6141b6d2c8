//! HTTP+SSE transport: `GET /sse` opens an event stream and hands the client
//! an `endpoint` event naming the URL to post JSON-RPC requests back to;
//! `POST /sse?session_id=<id>` delivers the response asynchronously over that
//! stream instead of in the HTTP response body. Grounded on the corpus's
//! `axum::response::sse::{Sse, Event}` + `async_stream::stream!` idiom
//! (`dashflow_langserve::handler::stream_handler`).

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use dashmap::DashMap;
use devguard_admission::AdmissionGate;
use devguard_protocol::JsonRpcRequest;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dispatch::dispatch;
use crate::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct SseState {
    pub app: AppState,
    pub admission: Arc<AdmissionGate>,
    sessions: Arc<DashMap<String, mpsc::UnboundedSender<String>>>,
}

impl SseState {
    pub fn new(app: AppState, admission: Arc<AdmissionGate>) -> Self {
        Self {
            app,
            admission,
            sessions: Arc::new(DashMap::new()),
        }
    }
}

pub fn router(state: SseState) -> Router {
    Router::new()
        .route("/sse", get(open_stream).post(post_message))
        .with_state(state)
}

pub async fn run(state: SseState, addr: &str) -> anyhow::Result<()> {
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "devguard MCP SSE server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn open_stream(
    State(state): State<SseState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let authorization = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    if let Err(err) = state.admission.admit(remote.ip(), authorization).await {
        warn!(%remote, %err, "sse admission rejected");
        return axum::http::StatusCode::UNAUTHORIZED.into_response();
    }

    let session_id = Uuid::new_v4().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    state.sessions.insert(session_id.clone(), tx);

    let sessions = state.sessions.clone();
    let endpoint = format!("/sse?session_id={session_id}");
    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint));

        loop {
            tokio::select! {
                message = rx.recv() => {
                    match message {
                        Some(payload) => yield Ok(Event::default().event("message").data(payload)),
                        None => break,
                    }
                }
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    yield Ok(Event::default().comment("heartbeat"));
                }
            }
        }

        sessions.remove(&session_id);
    };

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

#[derive(Deserialize)]
struct SessionQuery {
    session_id: String,
}

async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<SessionQuery>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let Some(sender) = state.sessions.get(&query.session_id).map(|s| s.clone()) else {
        return (axum::http::StatusCode::BAD_REQUEST, Json(json!({"error": "unknown session_id"}))).into_response();
    };

    let app = state.app.clone();
    tokio::spawn(async move {
        let response = dispatch(request, &app).await;
        if response.is_notification_ack() {
            return;
        }
        if let Ok(payload) = serde_json::to_string(&response) {
            let _ = sender.send(payload);
        }
    });

    axum::http::StatusCode::ACCEPTED.into_response()
}
