use serde::{Deserialize, Serialize};
use table::{SemanticMatch, TableError};
use thiserror::Error;

/// Query for the matches of one semantic identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchRequest {
    pub semantic_id: String,
    /// Results must score strictly above this threshold.
    pub score_limit: f64,
    /// When `true` only the local table is consulted.
    #[serde(default = "MatchRequest::default_local_only")]
    pub local_only: bool,
    /// Free-text hint, forwarded to peers but never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-text hint, forwarded to peers but never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Number of federation hops this request has already travelled.
    #[serde(default)]
    pub federation_depth: u32,
}

impl MatchRequest {
    pub(crate) fn default_local_only() -> bool {
        true
    }

    /// Local-only request with no hints.
    pub fn new(semantic_id: impl Into<String>, score_limit: f64) -> Self {
        Self {
            semantic_id: semantic_id.into(),
            score_limit,
            local_only: true,
            name: None,
            definition: None,
            federation_depth: 0,
        }
    }

    pub fn federated(mut self) -> Self {
        self.local_only = false;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.semantic_id.trim().is_empty() {
            return Err(MatchError::InvalidRequest(
                "semantic_id must not be empty".into(),
            ));
        }
        if !self.score_limit.is_finite() || !(0.0..=1.0).contains(&self.score_limit) {
            return Err(MatchError::InvalidRequest(format!(
                "score_limit must be within [0, 1], got {}",
                self.score_limit
            )));
        }
        Ok(())
    }

    /// Sub-request sent to the peer owning `via.match_semantic_id`.
    ///
    /// The limit is relaxed by `via.score` so that composed results can be
    /// compared against the original threshold.
    pub(crate) fn delegated(&self, via: &SemanticMatch) -> MatchRequest {
        MatchRequest {
            semantic_id: via.match_semantic_id.clone(),
            score_limit: self.score_limit / via.score,
            local_only: false,
            name: self.name.clone(),
            definition: self.definition.clone(),
            federation_depth: self.federation_depth.saturating_add(1),
        }
    }
}

/// Answer to a [`MatchRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchResponse {
    #[serde(default)]
    pub matches: Vec<SemanticMatch>,
}

/// Batch of edges submitted for insertion or removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchesList {
    pub matches: Vec<SemanticMatch>,
}

impl From<Vec<SemanticMatch>> for MatchesList {
    fn from(matches: Vec<SemanticMatch>) -> Self {
        Self { matches }
    }
}

/// What happened to each federation candidate of one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FederationSummary {
    /// Local matches whose target lives in another namespace.
    pub candidates: usize,
    /// Candidates the resolver could not map to a peer.
    pub unresolved: usize,
    /// Candidates resolving to this service itself.
    pub skipped: usize,
    /// Peers that failed, timed out, or were short-circuited.
    pub peer_failures: usize,
    /// Subset of `peer_failures` skipped because the peer's circuit was open.
    pub circuit_open: usize,
    /// Peers that answered.
    pub peers_answered: usize,
    /// Candidates abandoned when the overall deadline passed.
    pub deadline_expired: usize,
    /// Remote matches accepted into the response.
    pub remote_matches: usize,
    /// Federation was requested but the hop limit was reached.
    pub depth_exhausted: bool,
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid match: {0}")]
    InvalidMatch(String),
    #[error("table error: {0}")]
    Table(#[source] TableError),
}

impl From<TableError> for MatchError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::InvalidMatch(reason) => MatchError::InvalidMatch(reason),
            other => MatchError::Table(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_defaults_to_local_only() {
        let request: MatchRequest = serde_json::from_value(json!({
            "semantic_id": "s-heppner.com/semanticID/one",
            "score_limit": 0.5
        }))
        .unwrap();
        assert!(request.local_only);
        assert_eq!(request.federation_depth, 0);
        assert_eq!(request.name, None);
    }

    #[test]
    fn request_validation() {
        assert!(MatchRequest::new("a.com/x", 0.0).validate().is_ok());
        assert!(MatchRequest::new("a.com/x", 1.0).validate().is_ok());
        for limit in [-0.1, 1.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                MatchRequest::new("a.com/x", limit).validate(),
                Err(MatchError::InvalidRequest(_))
            ));
        }
        assert!(matches!(
            MatchRequest::new("  ", 0.5).validate(),
            Err(MatchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn delegated_request_relaxes_limit_and_counts_hop() {
        let request = MatchRequest::new("s-heppner.com/semanticID/three", 0.4)
            .federated()
            .with_name("three");
        let via = SemanticMatch::new(
            "s-heppner.com/semanticID/three",
            "remote-service.com/semanticID/trois",
            0.8,
        );

        let sub = request.delegated(&via);
        assert_eq!(sub.semantic_id, "remote-service.com/semanticID/trois");
        assert!((sub.score_limit - 0.5).abs() < 1e-12);
        assert!(!sub.local_only);
        assert_eq!(sub.name.as_deref(), Some("three"));
        assert_eq!(sub.federation_depth, 1);
    }

    #[test]
    fn table_errors_map_to_invalid_match() {
        let err: MatchError = TableError::InvalidMatch("score".into()).into();
        assert!(matches!(err, MatchError::InvalidMatch(_)));
    }
}
