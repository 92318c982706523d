//! Prometheus-backed matching metrics.
//!
//! The `metrics` macros are no-ops until a recorder is installed, which
//! [`install_recorder`] does once from `start_server`.

use std::time::Duration;

use matcher::{MatchMetrics, PeerOutcome};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// [`MatchMetrics`] implementation publishing through the `metrics` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl MatchMetrics for PrometheusMetrics {
    fn record_request(&self, local_only: bool, latency: Duration, matches: usize) {
        let mode = if local_only { "local" } else { "federated" };
        metrics::counter!("semantic_matcher_requests_total", "mode" => mode).increment(1);
        metrics::histogram!("semantic_matcher_request_duration_seconds", "mode" => mode)
            .record(latency.as_secs_f64());
        metrics::histogram!("semantic_matcher_matches_returned", "mode" => mode)
            .record(matches as f64);
    }

    fn record_peer(&self, endpoint: Option<&str>, outcome: PeerOutcome, latency: Duration) {
        let endpoint = endpoint.unwrap_or("unresolved").to_string();
        metrics::counter!(
            "semantic_matcher_peer_calls_total",
            "endpoint" => endpoint.clone(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
        metrics::histogram!("semantic_matcher_peer_duration_seconds", "endpoint" => endpoint)
            .record(latency.as_secs_f64());
    }

    fn record_mutation(&self, operation: &'static str, edges: usize) {
        metrics::counter!("semantic_matcher_table_mutations_total", "operation" => operation)
            .increment(edges as u64);
    }
}

/// Install the global Prometheus recorder and return its render handle.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}
