//! API route handlers
//!
//! - `health`: liveness, readiness and metrics
//! - `matching`: the equivalence table and match queries

pub mod health;
pub mod matching;

use crate::error::{ServerError, ServerResult};
use axum::extract::FromRequest;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// JSON body extractor whose rejections use the server's error format.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);

/// Service name, version and routes
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Semantic Matching Service",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/all_matches",
            "/get_matches",
            "/post_matches",
            "/remove_matches",
            "/clear",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
