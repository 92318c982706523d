use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::ResolutionCache;
use crate::namespace::namespace_of;
use crate::types::{Endpoint, Resolution, Resolver, ResolverError, UnresolvedReason};

/// Route exposed by the service directory.
pub const DIRECTORY_ROUTE: &str = "get_semantic_matching_service";

pub const DEFAULT_RESOLVER_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Serialize)]
struct DirectoryRequest<'a> {
    semantic_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    semantic_matching_service_endpoint: String,
}

/// Resolver backed by a remote service directory.
///
/// Answers are cached per namespace, so every identifier of a namespace
/// costs one directory round trip per TTL window. Negative answers are not
/// cached.
pub struct HttpResolver {
    client: Client,
    directory: Endpoint,
    cache: ResolutionCache,
}

impl HttpResolver {
    pub fn new(directory_url: impl AsRef<str>) -> Result<Self, ResolverError> {
        Self::build(directory_url.as_ref(), DEFAULT_RESOLVER_TIMEOUT, DEFAULT_CACHE_TTL)
    }

    /// Replace the per-request timeout; rebuilds the HTTP client.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self, ResolverError> {
        let ttl = self.cache_ttl();
        Self::build(self.directory.as_str(), timeout, ttl)
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = ResolutionCache::new(ttl);
        self
    }

    pub fn directory(&self) -> &Endpoint {
        &self.directory
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    fn cache_ttl(&self) -> Duration {
        self.cache.ttl()
    }

    fn build(directory_url: &str, timeout: Duration, ttl: Duration) -> Result<Self, ResolverError> {
        let trimmed = directory_url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ResolverError::InvalidUrl(trimmed.to_owned()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            directory: Endpoint::new(trimmed),
            cache: ResolutionCache::new(ttl),
        })
    }

    async fn query_directory(&self, semantic_id: &str) -> Resolution {
        let url = self.directory.join(DIRECTORY_ROUTE);
        // The directory expects a JSON body on a GET.
        let response = match self
            .client
            .get(&url)
            .json(&DirectoryRequest { semantic_id })
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(directory = %self.directory, error = %err, "service directory unreachable");
                return Resolution::Unresolved(UnresolvedReason::DirectoryUnavailable(
                    err.to_string(),
                ));
            }
        };

        match response.status() {
            StatusCode::OK => match response.json::<DirectoryResponse>().await {
                Ok(body) => {
                    let endpoint = Endpoint::new(body.semantic_matching_service_endpoint);
                    if endpoint.as_str().is_empty() {
                        return Resolution::Unresolved(UnresolvedReason::DirectoryUnavailable(
                            "empty endpoint in directory answer".to_owned(),
                        ));
                    }
                    Resolution::Resolved(endpoint)
                }
                Err(err) => {
                    warn!(directory = %self.directory, error = %err, "malformed directory answer");
                    Resolution::Unresolved(UnresolvedReason::DirectoryUnavailable(err.to_string()))
                }
            },
            StatusCode::NOT_FOUND => Resolution::Unresolved(UnresolvedReason::UnknownNamespace),
            status => {
                warn!(directory = %self.directory, %status, "service directory returned error status");
                Resolution::Unresolved(UnresolvedReason::DirectoryUnavailable(format!(
                    "status {status}"
                )))
            }
        }
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, semantic_id: &str) -> Resolution {
        let Some(namespace) = namespace_of(semantic_id) else {
            return Resolution::Unresolved(UnresolvedReason::InvalidIdentifier);
        };
        if let Some(endpoint) = self.cache.get(namespace) {
            debug!(namespace, endpoint = %endpoint, "resolution cache hit");
            return Resolution::Resolved(endpoint);
        }

        let resolution = self.query_directory(semantic_id).await;
        if let Resolution::Resolved(endpoint) = &resolution {
            debug!(namespace, endpoint = %endpoint, "resolved namespace");
            self.cache.insert(namespace, endpoint.clone());
        }
        resolution
    }
}
