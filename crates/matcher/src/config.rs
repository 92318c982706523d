use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::{CircuitBreakerConfig, RetryConfig};

/// Tuning for cross-service matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederationConfig {
    /// Upper bound on outstanding peer calls per request.
    pub max_concurrent_peers: usize,
    /// Timeout of a single peer attempt.
    #[serde(with = "crate::serde_millis")]
    pub peer_timeout: Duration,
    /// Budget for the whole federation phase of one request.
    #[serde(with = "crate::serde_millis")]
    pub deadline: Duration,
    /// Requests that already travelled this many hops are answered locally.
    pub max_federation_depth: u32,
    /// Public base URL of this service; peers resolving to it are skipped.
    pub own_endpoint: Option<String>,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_peers: 8,
            peer_timeout: Duration::from_secs(2),
            deadline: Duration::from_secs(5),
            max_federation_depth: 4,
            own_endpoint: None,
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl FederationConfig {
    pub fn with_max_concurrent_peers(mut self, max: usize) -> Self {
        self.max_concurrent_peers = max;
        self
    }

    pub fn with_peer_timeout(mut self, timeout: Duration) -> Self {
        self.peer_timeout = timeout;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_max_federation_depth(mut self, depth: u32) -> Self {
        self.max_federation_depth = depth;
        self
    }

    pub fn with_own_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.own_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }
}
