use crate::error::{ServerError, ServerResult};
use crate::routes::ApiJson;
use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use matcher::{MatchRequest, MatchesList};
use std::sync::Arc;

/// Every stored edge, grouped by source identifier
pub async fn all_matches(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(state.service.all_matches())
}

/// Matches for one identifier, optionally federated
///
/// Served on both GET and POST; both take the request as JSON body.
pub async fn get_matches(
    State(state): State<Arc<ServerState>>,
    ApiJson(request): ApiJson<MatchRequest>,
) -> ServerResult<impl IntoResponse> {
    let (response, summary) = state.service.get_matches_with_summary(&request).await?;
    if !request.local_only {
        tracing::debug!(
            semantic_id = %request.semantic_id,
            candidates = summary.candidates,
            answered = summary.peers_answered,
            unresolved = summary.unresolved,
            failures = summary.peer_failures,
            deadline_expired = summary.deadline_expired,
            "federation summary"
        );
    }
    Ok(Json(response))
}

/// Add edges; all-or-nothing on validation
pub async fn post_matches(
    State(state): State<Arc<ServerState>>,
    ApiJson(list): ApiJson<MatchesList>,
) -> ServerResult<StatusCode> {
    let added = state.service.post_matches(list)?;
    if added > 0 {
        state.persist_after_change().await?;
    }
    Ok(StatusCode::OK)
}

/// Remove edges; 404 when any submitted edge was not stored
pub async fn remove_matches(
    State(state): State<Arc<ServerState>>,
    ApiJson(list): ApiJson<MatchesList>,
) -> ServerResult<StatusCode> {
    let removals = state.service.remove_matches(&list);
    let missing = removals.iter().filter(|r| !r.is_removed()).count();
    if missing < removals.len() {
        state.persist_after_change().await?;
    }
    if missing > 0 {
        return Err(ServerError::EdgeNotFound(missing));
    }
    Ok(StatusCode::OK)
}

/// Drop every edge
pub async fn clear(State(state): State<Arc<ServerState>>) -> ServerResult<StatusCode> {
    state.service.clear();
    state.persist_after_change().await?;
    Ok(StatusCode::OK)
}
