use std::collections::HashMap;

use async_trait::async_trait;

use crate::namespace::namespace_of;
use crate::types::{Endpoint, Resolution, Resolver, UnresolvedReason};

/// Fixed namespace -> endpoint map, for tests and closed deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    namespaces: HashMap<String, Endpoint>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>, endpoint: impl Into<Endpoint>) -> Self {
        self.namespaces.insert(namespace.into(), endpoint.into());
        self
    }

    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Endpoint>,
    {
        Self {
            namespaces: entries
                .into_iter()
                .map(|(namespace, endpoint)| (namespace.into(), endpoint.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, semantic_id: &str) -> Resolution {
        let Some(namespace) = namespace_of(semantic_id) else {
            return Resolution::Unresolved(UnresolvedReason::InvalidIdentifier);
        };
        match self.namespaces.get(namespace) {
            Some(endpoint) => Resolution::Resolved(endpoint.clone()),
            None => Resolution::Unresolved(UnresolvedReason::UnknownNamespace),
        }
    }
}
