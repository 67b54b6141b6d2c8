//! HTTP JSON-RPC transport: `GET /health`, `POST /` JSON-RPC handler,
//! shared `Arc` state, `tower_http::trace::TraceLayer` for request logging.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use devguard_admission::AdmissionGate;
use devguard_protocol::JsonRpcRequest;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::dispatch::dispatch;
use crate::state::AppState;

#[derive(Clone)]
pub struct HttpState {
    pub app: AppState,
    pub admission: Arc<AdmissionGate>,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/stats", get(stats))
        .route("/metrics", get(metrics))
        .route("/", post(jsonrpc))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(state: HttpState, addr: &str) -> anyhow::Result<()> {
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "devguard MCP HTTP server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn info(State(state): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "name": state.app.config.server_name,
        "version": state.app.config.server_version,
        "tools": state.app.tools.list_tools().len(),
    }))
}

async fn stats(State(state): State<HttpState>) -> impl IntoResponse {
    Json(serde_json::to_value(state.admission.metrics.snapshot()).expect("MetricsSnapshot serializes"))
}

async fn metrics(State(state): State<HttpState>) -> impl IntoResponse {
    state.admission.metrics.prometheus_text()
}

async fn jsonrpc(
    State(state): State<HttpState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let authorization = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let permit = match state.admission.admit(remote.ip(), authorization).await {
        Ok(permit) => permit,
        Err(err) => {
            warn!(%remote, %err, "admission rejected");
            return admission_error_response(err).into_response();
        }
    };

    let started = Instant::now();
    let response = dispatch(request, &state.app).await;
    state.admission.metrics.record(started.elapsed().as_millis() as u64, response.error.is_none());
    drop(permit);

    Json(response).into_response()
}

fn admission_error_response(err: devguard_admission::AdmissionError) -> impl IntoResponse {
    use devguard_admission::AdmissionError as E;
    let (status, retry_after_secs) = match err {
        E::Unauthorized | E::IpNotAllowed => (StatusCode::UNAUTHORIZED, None),
        E::RateLimited { retry_after_secs } => (StatusCode::TOO_MANY_REQUESTS, Some(retry_after_secs)),
        E::Overloaded => (StatusCode::SERVICE_UNAVAILABLE, None),
    };
    (status, Json(json!({"error": err.to_string(), "retry_after_secs": retry_after_secs})))
}
