use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use resolver::{namespace_of, Endpoint, Resolution, Resolver};
use table::{EquivalenceTable, Removal, SemanticMatch};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::FederationConfig;
use crate::metrics::{MatchMetrics, PeerOutcome};
use crate::peer::{PeerClient, PeerError};
use crate::resilience::{execute_with_retry_async, CircuitBreakerManager, PeerHealth};
use crate::types::{FederationSummary, MatchError, MatchRequest, MatchResponse, MatchesList};


/// Outcome of delegating one local match to its peer.
enum Delegation {
    Answered(Vec<SemanticMatch>),
    Unresolved,
    Skipped,
    Failed(PeerError),
    DeadlineExpired,
}

/// Answers match queries from the local table and, on request, from the
/// peers owning the namespaces the local results point into.
pub struct MatchingService {
    table: Arc<EquivalenceTable>,
    resolver: Arc<dyn Resolver>,
    peers: Arc<dyn PeerClient>,
    config: FederationConfig,
    own_endpoint: Option<Endpoint>,
    breakers: CircuitBreakerManager,
    metrics: Option<Arc<dyn MatchMetrics>>,
}

impl MatchingService {
    pub fn new(
        table: Arc<EquivalenceTable>,
        resolver: Arc<dyn Resolver>,
        peers: Arc<dyn PeerClient>,
    ) -> Self {
        Self::with_config(table, resolver, peers, FederationConfig::default())
    }

    pub fn with_config(
        table: Arc<EquivalenceTable>,
        resolver: Arc<dyn Resolver>,
        peers: Arc<dyn PeerClient>,
        config: FederationConfig,
    ) -> Self {
        let own_endpoint = config.own_endpoint.as_deref().map(Endpoint::new);
        let breakers = CircuitBreakerManager::new(config.circuit_breaker);
        Self {
            table,
            resolver,
            peers,
            config,
            own_endpoint,
            breakers,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn table(&self) -> &Arc<EquivalenceTable> {
        &self.table
    }

    pub fn config(&self) -> &FederationConfig {
        &self.config
    }

    /// Breaker state of every peer contacted so far.
    pub fn peer_health(&self) -> Vec<PeerHealth> {
        self.breakers.snapshot()
    }

    pub async fn get_matches(&self, request: &MatchRequest) -> Result<MatchResponse, MatchError> {
        self.get_matches_with_summary(request)
            .await
            .map(|(response, _)| response)
    }

    /// Local matches first, then composed remote matches in candidate order.
    pub async fn get_matches_with_summary(
        &self,
        request: &MatchRequest,
    ) -> Result<(MatchResponse, FederationSummary), MatchError> {
        request.validate()?;
        let started = Instant::now();
        let mut summary = FederationSummary::default();

        let local = self
            .table
            .local_matches(&request.semantic_id, request.score_limit);
        let mut matches = local.clone();

        if !request.local_only {
            if request.federation_depth >= self.config.max_federation_depth {
                summary.depth_exhausted = true;
                debug!(
                    semantic_id = %request.semantic_id,
                    depth = request.federation_depth,
                    "federation depth exhausted, answering locally"
                );
            } else {
                let remote = self.federate(request, &local, &mut summary).await;
                summary.remote_matches = remote.len();
                matches.extend(remote);
            }
        }

        info!(
            semantic_id = %request.semantic_id,
            score_limit = request.score_limit,
            local_only = request.local_only,
            local = local.len(),
            remote = summary.remote_matches,
            "matched"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_request(request.local_only, started.elapsed(), matches.len());
        }

        Ok((MatchResponse { matches }, summary))
    }

    async fn federate(
        &self,
        request: &MatchRequest,
        local: &[SemanticMatch],
        summary: &mut FederationSummary,
    ) -> Vec<SemanticMatch> {
        let candidates: Vec<&SemanticMatch> = local
            .iter()
            .filter(|m| crosses_namespace(&request.semantic_id, &m.match_semantic_id))
            .collect();
        summary.candidates = candidates.len();
        if candidates.is_empty() {
            return Vec::new();
        }

        let deadline = Instant::now() + self.config.deadline;
        let concurrency = self.config.max_concurrent_peers.max(1);

        let mut outcomes: Vec<(usize, &SemanticMatch, Delegation)> =
            stream::iter(
                candidates
                    .into_iter()
                    .enumerate()
                    .map(|(idx, via)| async move {
                        (idx, via, self.delegate(request, via, deadline).await)
                    })
                    .collect::<Vec<_>>(),
            )
            .buffer_unordered(concurrency)
            .collect()
            .await;

        // Restore candidate order
        outcomes.sort_by_key(|(idx, _, _)| *idx);

        let mut remote = Vec::new();
        for (_, via, outcome) in outcomes {
            match outcome {
                Delegation::Answered(answer) => {
                    summary.peers_answered += 1;
                    remote.extend(compose(via, answer, request.score_limit));
                }
                Delegation::Unresolved => summary.unresolved += 1,
                Delegation::Skipped => summary.skipped += 1,
                Delegation::Failed(err) => {
                    if err == PeerError::CircuitOpen {
                        summary.circuit_open += 1;
                    }
                    summary.peer_failures += 1;
                }
                Delegation::DeadlineExpired => summary.deadline_expired += 1,
            }
        }
        remote
    }

    async fn delegate(
        &self,
        request: &MatchRequest,
        via: &SemanticMatch,
        deadline: Instant,
    ) -> Delegation {
        let started = Instant::now();
        let target = via.match_semantic_id.as_str();

        let endpoint = match timeout_at(deadline, self.resolver.resolve(target)).await {
            Ok(Resolution::Resolved(endpoint)) => endpoint,
            Ok(Resolution::Unresolved(reason)) => {
                debug!(semantic_id = target, %reason, "no peer for match target");
                self.record_peer(None, PeerOutcome::Unresolved, started);
                return Delegation::Unresolved;
            }
            Err(_) => {
                warn!(semantic_id = target, "deadline passed while resolving");
                self.record_peer(None, PeerOutcome::DeadlineExpired, started);
                return Delegation::DeadlineExpired;
            }
        };

        if self.own_endpoint.as_ref() == Some(&endpoint) {
            debug!(semantic_id = target, "match target resolves to this service");
            self.record_peer(Some(endpoint.as_str()), PeerOutcome::Skipped, started);
            return Delegation::Skipped;
        }

        let breaker = self.breakers.get_or_create(endpoint.as_str());
        if !breaker.allow_request() {
            debug!(endpoint = %endpoint, "peer circuit open, skipping");
            self.record_peer(Some(endpoint.as_str()), PeerOutcome::CircuitOpen, started);
            return Delegation::Failed(PeerError::CircuitOpen);
        }

        let sub_request = request.delegated(via);
        let peer_timeout = self.config.peer_timeout;
        let peers = &self.peers;
        let endpoint_ref = &endpoint;
        let sub_ref = &sub_request;
        let call = execute_with_retry_async(
            &self.config.retry,
            Some(deadline),
            PeerError::is_transient,
            move |_attempt| async move {
                timeout(peer_timeout, peers.get_matches(endpoint_ref, sub_ref))
                    .await
                    .unwrap_or(Err(PeerError::Timeout))
            },
        );

        match timeout_at(deadline, call).await {
            Ok(retried) => match retried.result {
                Ok(response) => {
                    self.breakers.record_success(endpoint.as_str());
                    debug!(
                        endpoint = %endpoint,
                        attempts = retried.attempts,
                        matches = response.matches.len(),
                        "peer answered"
                    );
                    self.record_peer(Some(endpoint.as_str()), PeerOutcome::Answered, started);
                    Delegation::Answered(response.matches)
                }
                Err(err) => {
                    self.breakers.record_failure(endpoint.as_str());
                    warn!(
                        endpoint = %endpoint,
                        attempts = retried.attempts,
                        error = %err,
                        "peer failed, continuing without it"
                    );
                    self.record_peer(Some(endpoint.as_str()), PeerOutcome::Failed, started);
                    Delegation::Failed(err)
                }
            },
            Err(_) => {
                // Cancelled calls count as failures so a half-open probe settles.
                self.breakers.record_failure(endpoint.as_str());
                warn!(endpoint = %endpoint, "deadline passed before peer answered");
                self.record_peer(Some(endpoint.as_str()), PeerOutcome::DeadlineExpired, started);
                Delegation::DeadlineExpired
            }
        }
    }

    fn record_peer(&self, endpoint: Option<&str>, outcome: PeerOutcome, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics.record_peer(endpoint, outcome, started.elapsed());
        }
    }

    fn record_mutation(&self, operation: &'static str, edges: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.record_mutation(operation, edges);
        }
    }

    /// Validate every edge, then add them all. Returns how many were new.
    pub fn post_matches(&self, list: MatchesList) -> Result<usize, MatchError> {
        let submitted = list.matches.len();
        let added = self.table.add_all(list.matches)?;
        info!(submitted, added, "matches posted");
        self.record_mutation("add", added);
        Ok(added)
    }

    /// Remove each edge; the result lists one [`Removal`] per submitted edge.
    ///
    /// Edges that were found are removed even when others were not.
    pub fn remove_matches(&self, list: &MatchesList) -> Vec<Removal> {
        let removals: Vec<Removal> = list.matches.iter().map(|m| self.table.remove(m)).collect();
        let removed = removals.iter().filter(|r| r.is_removed()).count();
        info!(submitted = removals.len(), removed, "matches removed");
        self.record_mutation("remove", removed);
        removals
    }

    pub fn all_matches(&self) -> BTreeMap<String, Vec<SemanticMatch>> {
        self.table.all_matches()
    }

    pub fn clear(&self) {
        let edges = self.table.len();
        self.table.clear();
        info!(edges, "equivalence table cleared");
        self.record_mutation("clear", edges);
    }
}

impl std::fmt::Debug for MatchingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingService")
            .field("table", &self.table)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Whether `target` lives in a known namespace other than the root's.
fn crosses_namespace(root: &str, target: &str) -> bool {
    match namespace_of(target) {
        Some(target_ns) => namespace_of(root) != Some(target_ns),
        None => false,
    }
}

/// Re-root a peer's answer onto the local match it was delegated through.
fn compose(via: &SemanticMatch, answer: Vec<SemanticMatch>, score_limit: f64) -> Vec<SemanticMatch> {
    answer
        .into_iter()
        .filter(|remote| match remote.validate() {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "dropping invalid remote match");
                false
            }
        })
        .map(|remote| remote.composed_onto(via))
        .filter(|composed| composed.score > score_limit)
        .collect()
}
