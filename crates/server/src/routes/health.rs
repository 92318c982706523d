use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use matcher::CircuitState;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Liveness: 200 while the process serves requests
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "semantic-matcher",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    }))
}

/// Readiness, with table size and the breaker state of known peers
pub async fn readiness_check(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let table = state.service.table();
    let peers = state.service.peer_health();
    let open_peers = peers
        .iter()
        .filter(|peer| peer.state != CircuitState::Closed)
        .count();

    Ok(Json(json!({
        "status": "ready",
        "service": "semantic-matcher",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
        "components": {
            "api": "ready",
            "table": {
                "sources": table.source_count(),
                "edges": table.len(),
            },
            "persistence": state
                .persistence
                .as_ref()
                .map(|p| p.path().display().to_string()),
            "peers": {
                "known": peers.len(),
                "degraded": open_peers,
                "detail": peers,
            },
        }
    })))
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> Response {
    match &state.metrics_handle {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": { "code": "METRICS_DISABLED", "message": "metrics recorder not installed" }
            })),
        )
            .into_response(),
    }
}
