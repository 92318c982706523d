use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use matcher::MatchError;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Request timeout")]
    Timeout,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    #[error("{0} of the submitted matches are not stored")]
    EdgeNotFound(usize),

    #[error("Table error: {0}")]
    Table(#[from] table::TableError),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Match(MatchError::InvalidRequest(_) | MatchError::InvalidMatch(_)) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::EdgeNotFound(_) | ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Match(MatchError::Table(_))
            | ServerError::Table(_)
            | ServerError::Persistence(_)
            | ServerError::Internal(_)
            | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Timeout => "REQUEST_TIMEOUT",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Match(MatchError::InvalidRequest(_)) => "INVALID_REQUEST",
            ServerError::Match(MatchError::InvalidMatch(_)) => "INVALID_MATCH",
            ServerError::Match(MatchError::Table(_)) | ServerError::Table(_) => "TABLE_ERROR",
            ServerError::EdgeNotFound(_) => "EDGE_NOT_FOUND",
            ServerError::Persistence(_) => "PERSISTENCE_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<resolver::ResolverError> for ServerError {
    fn from(err: resolver::ResolverError) -> Self {
        ServerError::Config(err.to_string())
    }
}

impl From<matcher::PeerError> for ServerError {
    fn from(err: matcher::PeerError) -> Self {
        ServerError::Config(format!("peer client: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
