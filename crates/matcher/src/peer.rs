use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use resolver::Endpoint;
use thiserror::Error;
use tracing::debug;

use crate::types::{MatchRequest, MatchResponse};

/// Route every matching service exposes for queries.
pub const GET_MATCHES_ROUTE: &str = "get_matches";

/// Failure of a single peer call. Never fails the originating request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PeerError {
    #[error("peer timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("peer returned status {0}")]
    Status(u16),
    #[error("undecodable peer answer: {0}")]
    Decode(String),
    #[error("peer circuit is open")]
    CircuitOpen,
}

impl PeerError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PeerError::Timeout | PeerError::Transport(_) => true,
            PeerError::Status(status) => matches!(status, 408 | 429) || *status >= 500,
            PeerError::Decode(_) | PeerError::CircuitOpen => false,
        }
    }
}

/// Transport used to ask a peer matching service for matches.
#[async_trait]
pub trait PeerClient: Send + Sync {
    async fn get_matches(
        &self,
        endpoint: &Endpoint,
        request: &MatchRequest,
    ) -> Result<MatchResponse, PeerError>;
}

/// [`PeerClient`] speaking the JSON protocol over HTTP:
/// `GET {endpoint}/get_matches` with the request as body.
#[derive(Debug, Clone)]
pub struct HttpPeerClient {
    client: Client,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> Result<Self, PeerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PeerError::Transport(err.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn get_matches(
        &self,
        endpoint: &Endpoint,
        request: &MatchRequest,
    ) -> Result<MatchResponse, PeerError> {
        let url = endpoint.join(GET_MATCHES_ROUTE);
        debug!(%url, semantic_id = %request.semantic_id, depth = request.federation_depth, "querying peer");

        let response = self
            .client
            .get(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    PeerError::Timeout
                } else {
                    PeerError::Transport(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PeerError::Status(status.as_u16()));
        }

        response
            .json::<MatchResponse>()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    PeerError::Timeout
                } else {
                    PeerError::Decode(err.to_string())
                }
            })
    }
}
