use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base URL of a peer matching service, normalised without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(url: impl AsRef<str>) -> Self {
        Self(url.as_ref().trim().trim_end_matches('/').to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `{endpoint}/{route}`.
    pub fn join(&self, route: &str) -> String {
        format!("{}/{}", self.0, route.trim_start_matches('/'))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(value: &str) -> Self {
        Endpoint::new(value)
    }
}

impl From<String> for Endpoint {
    fn from(value: String) -> Self {
        Endpoint::new(value)
    }
}

/// Why an identifier could not be mapped to a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The identifier has no namespace segment.
    InvalidIdentifier,
    /// The directory knows no service for the namespace.
    UnknownNamespace,
    /// The directory could not be reached or answered garbage.
    DirectoryUnavailable(String),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::InvalidIdentifier => f.write_str("identifier has no namespace"),
            UnresolvedReason::UnknownNamespace => f.write_str("namespace is not registered"),
            UnresolvedReason::DirectoryUnavailable(detail) => {
                write!(f, "directory unavailable: {detail}")
            }
        }
    }
}

/// Result of resolving an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Endpoint),
    Unresolved(UnresolvedReason),
}

impl Resolution {
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            Resolution::Resolved(endpoint) => Some(endpoint),
            Resolution::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Maps a semantic identifier to the matching service authoritative for its
/// namespace.
///
/// Implementations never fail: every problem is reported as
/// [`Resolution::Unresolved`] so callers can carry on with reduced coverage.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, semantic_id: &str) -> Resolution;
}

/// Errors raised while constructing a resolver.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("invalid directory url: {0}")]
    InvalidUrl(String),
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}
