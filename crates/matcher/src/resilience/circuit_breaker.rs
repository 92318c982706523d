//! Circuit breaker for federation peers.
//!
//! After `failure_threshold` consecutive failures a peer is skipped until
//! `reset_timeout` has passed; the next call is then let through as a probe
//! (half-open) and its outcome decides whether the circuit closes again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{info, warn};

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// Duration to wait before letting a probe through (half-open).
    #[serde(with = "crate::serde_millis")]
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }
}

/// Current state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Requests are allowed.
    Closed,
    /// Requests are rejected.
    Open,
    /// A probe request is allowed.
    HalfOpen,
}

#[derive(Debug)]
struct Transition {
    state: CircuitState,
    changed_at: Instant,
}

/// Per-peer circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    transition: Mutex<Transition>,
    failure_count: AtomicU64,
    success_count: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            transition: Mutex::new(Transition {
                state: CircuitState::Closed,
                changed_at: Instant::now(),
            }),
            failure_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Transition> {
        self.transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check if a request should be allowed through.
    pub fn allow_request(&self) -> bool {
        let mut transition = self.lock();

        match transition.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                if transition.changed_at.elapsed() >= self.config.reset_timeout {
                    transition.state = CircuitState::HalfOpen;
                    transition.changed_at = Instant::now();
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        self.success_count.fetch_add(1, Ordering::Relaxed);

        let mut transition = self.lock();
        match transition.state {
            CircuitState::HalfOpen => {
                transition.state = CircuitState::Closed;
                transition.changed_at = Instant::now();
                self.failure_count.store(0, Ordering::Relaxed);
            }
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Relaxed);
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failure; returns `true` when this call opened the circuit.
    pub fn record_failure(&self) -> bool {
        let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;

        let mut transition = self.lock();
        match transition.state {
            CircuitState::Closed if failures >= u64::from(self.config.failure_threshold.max(1)) => {
                transition.state = CircuitState::Open;
                transition.changed_at = Instant::now();
                true
            }
            CircuitState::HalfOpen => {
                transition.state = CircuitState::Open;
                transition.changed_at = Instant::now();
                true
            }
            _ => false,
        }
    }

    pub fn current_state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }
}

/// Health of one peer as seen by its breaker.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PeerHealth {
    pub endpoint: String,
    pub state: CircuitState,
    pub consecutive_failures: u64,
}

/// Breakers keyed by peer endpoint.
pub struct CircuitBreakerManager {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    default_config: CircuitBreakerConfig,
}

impl CircuitBreakerManager {
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            default_config,
        }
    }

    pub fn get_or_create(&self, endpoint: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(endpoint.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(self.default_config)))
            .clone()
    }

    /// Record a failure against `endpoint`, logging when its circuit opens.
    pub fn record_failure(&self, endpoint: &str) {
        if self.get_or_create(endpoint).record_failure() {
            warn!(endpoint, "peer circuit opened");
        }
    }

    pub fn record_success(&self, endpoint: &str) {
        let breaker = self.get_or_create(endpoint);
        let was_probing = breaker.current_state() == CircuitState::HalfOpen;
        breaker.record_success();
        if was_probing {
            info!(endpoint, "peer circuit closed");
        }
    }

    /// Every known peer, sorted by endpoint.
    pub fn snapshot(&self) -> Vec<PeerHealth> {
        let mut health: Vec<PeerHealth> = self
            .breakers
            .iter()
            .map(|entry| PeerHealth {
                endpoint: entry.key().clone(),
                state: entry.value().current_state(),
                consecutive_failures: entry.value().failure_count(),
            })
            .collect();
        health.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        health
    }

    pub fn reset_all(&self) {
        self.breakers.clear();
    }

    /// Unknown peers count as healthy.
    pub fn is_healthy(&self, endpoint: &str) -> bool {
        self.breakers
            .get(endpoint)
            .map(|breaker| breaker.current_state() == CircuitState::Closed)
            .unwrap_or(true)
    }
}

impl Default for CircuitBreakerManager {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
