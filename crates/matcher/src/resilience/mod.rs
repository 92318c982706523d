//! Peer resilience: retry with backoff and per-peer circuit breakers.

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerManager, CircuitState, PeerHealth,
};
pub use retry::{execute_with_retry_async, RetryConfig, RetryResult};
