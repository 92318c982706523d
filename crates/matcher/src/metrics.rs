use std::time::Duration;

/// How a single federation candidate ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerOutcome {
    Answered,
    Unresolved,
    Skipped,
    Failed,
    CircuitOpen,
    DeadlineExpired,
}

impl PeerOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            PeerOutcome::Answered => "answered",
            PeerOutcome::Unresolved => "unresolved",
            PeerOutcome::Skipped => "skipped",
            PeerOutcome::Failed => "failed",
            PeerOutcome::CircuitOpen => "circuit_open",
            PeerOutcome::DeadlineExpired => "deadline_expired",
        }
    }
}

/// Observer for matching activity.
///
/// Passed to [`MatchingService::with_metrics`](crate::MatchingService::with_metrics);
/// the service never installs a global recorder itself.
pub trait MatchMetrics: Send + Sync {
    /// One completed `get_matches` call.
    fn record_request(&self, local_only: bool, latency: Duration, matches: usize);

    /// One federation candidate. `endpoint` is `None` when nothing resolved.
    fn record_peer(&self, endpoint: Option<&str>, outcome: PeerOutcome, latency: Duration);

    /// Edges added, removed, or cleared.
    fn record_mutation(&self, _operation: &'static str, _edges: usize) {}
}
