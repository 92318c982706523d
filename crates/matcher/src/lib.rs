//! # Semantic Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` answers "what is equivalent to this semantic identifier?" on top
//! of the local [`table::EquivalenceTable`]. A request is first answered from
//! the table; when the caller allows it, every local result that points into
//! a foreign namespace is delegated to the matching service owning that
//! namespace, and the peer's answers are composed back onto the local result
//! they were reached through.
//!
//! ## Core Types
//!
//! - [`MatchingService`]: the service object wiring table, resolver, peer
//!   transport, circuit breakers and an optional [`MatchMetrics`] observer.
//! - [`MatchRequest`] / [`MatchResponse`] / [`MatchesList`]: wire records.
//! - [`FederationSummary`]: per-request account of every delegation.
//! - [`PeerClient`] / [`HttpPeerClient`]: peer transport.
//! - [`FederationConfig`]: fan-out bound, timeouts, deadline, retry and breaker
//!   tuning.
//!
//! ## Federation
//!
//! Delegation happens when the namespace of the query root differs from the
//! namespace of a local match target. The sub-request asks the peer for the
//! target with the limit relaxed by the local score (`score_limit / m.score`),
//! so a remote answer `r` becomes `root -> r.target` with score
//! `m.score * r.score` and `path = m.path ++ [m.target] ++ r.path`. Composed
//! matches not strictly above the original limit are dropped.
//!
//! Peer calls run with bounded concurrency, a per-attempt timeout, retries for
//! transient failures, a circuit breaker per peer and an overall deadline. A
//! failing peer only ever reduces coverage.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use matcher::{HttpPeerClient, MatchRequest, MatchingService};
//! use resolver::StaticResolver;
//! use table::{EquivalenceTable, SemanticMatch};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let table = Arc::new(EquivalenceTable::new());
//! table.add(SemanticMatch::new(
//!     "s-heppner.com/semanticID/three",
//!     "remote-service.com/semanticID/trois",
//!     1.0,
//! ))?;
//!
//! let resolver = StaticResolver::new().with_namespace("remote-service.com", "http://remote:8000");
//! let peers = HttpPeerClient::new(Duration::from_secs(2))?;
//! let service = MatchingService::new(table, Arc::new(resolver), Arc::new(peers));
//!
//! let request = MatchRequest::new("s-heppner.com/semanticID/three", 0.7).federated();
//! let response = service.get_matches(&request).await?;
//! for m in response.matches {
//!     println!("{} -> {} ({})", m.base_semantic_id, m.match_semantic_id, m.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod metrics;
pub mod peer;
pub mod resilience;
mod serde_millis;
pub mod types;

pub use crate::config::FederationConfig;
pub use crate::engine::MatchingService;
pub use crate::metrics::{MatchMetrics, PeerOutcome};
pub use crate::peer::{HttpPeerClient, PeerClient, PeerError, GET_MATCHES_ROUTE};
pub use crate::resilience::{CircuitBreakerConfig, CircuitState, PeerHealth, RetryConfig};
pub use crate::types::{FederationSummary, MatchError, MatchRequest, MatchResponse, MatchesList};
