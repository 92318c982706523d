use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::types::Endpoint;

/// Namespace -> endpoint answers with a time-to-live.
///
/// A zero TTL disables caching.
pub struct ResolutionCache {
    entries: DashMap<String, (Endpoint, Instant)>,
    ttl: Duration,
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, namespace: &str) -> Option<Endpoint> {
        if self.ttl.is_zero() {
            return None;
        }
        let endpoint = {
            let entry = self.entries.get(namespace)?;
            let (endpoint, stored_at) = entry.value();
            (stored_at.elapsed() < self.ttl).then(|| endpoint.clone())
        };
        if endpoint.is_none() {
            self.entries.remove(namespace);
        }
        endpoint
    }

    pub fn insert(&self, namespace: &str, endpoint: Endpoint) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries
            .insert(namespace.to_owned(), (endpoint, Instant::now()));
    }

    pub fn invalidate(&self, namespace: &str) {
        self.entries.remove(namespace);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
