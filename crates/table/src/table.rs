use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traversal;
use crate::types::{SemanticMatch, TableError};

#[cfg(test)]
mod tests;

/// Default cap on the number of edges in a derived path.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Outcome of [`EquivalenceTable::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// An identical edge was stored and has been removed.
    Removed,
    /// No identical edge was stored; the table is unchanged.
    NotFound,
}

impl Removal {
    pub fn is_removed(self) -> bool {
        matches!(self, Removal::Removed)
    }
}

/// The locally held equivalence graph: source identifier -> outgoing edges.
///
/// Reads take a shared lock and mutations an exclusive one, so a reader never
/// observes a half-updated edge sequence. Keys are kept sorted and no key ever
/// maps to an empty sequence.
///
/// Adding an edge that is already stored (value-identical, including
/// `meta_information`) is a no-op, which makes `add` idempotent.
pub struct EquivalenceTable {
    matches: RwLock<BTreeMap<String, Vec<SemanticMatch>>>,
    max_depth: usize,
}

impl EquivalenceTable {
    pub fn new() -> Self {
        Self {
            matches: RwLock::new(BTreeMap::new()),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Cap derived paths at `max_depth` edges (at least one).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Build a table from an edge list, validating every edge first.
    pub fn from_matches<I>(matches: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = SemanticMatch>,
    {
        let table = Self::new();
        table.add_all(matches.into_iter().collect())?;
        Ok(table)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Vec<SemanticMatch>>> {
        self.matches
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Vec<SemanticMatch>>> {
        self.matches
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `semantic_match` under its base identifier.
    ///
    /// Returns `Ok(false)` when an identical edge is already stored.
    pub fn add(&self, semantic_match: SemanticMatch) -> Result<bool, TableError> {
        semantic_match.validate()?;
        Ok(insert_edge(&mut self.write(), semantic_match))
    }

    /// Validate every edge, then store them all under one lock.
    ///
    /// A single invalid edge rejects the whole batch without touching the
    /// table. Returns how many edges were newly stored.
    pub fn add_all(&self, matches: Vec<SemanticMatch>) -> Result<usize, TableError> {
        for semantic_match in &matches {
            semantic_match.validate()?;
        }
        let mut graph = self.write();
        Ok(matches
            .into_iter()
            .map(|semantic_match| insert_edge(&mut graph, semantic_match))
            .filter(|inserted| *inserted)
            .count())
    }

    /// Remove one edge exactly equal to `semantic_match`.
    ///
    /// The source key disappears together with its last edge.
    pub fn remove(&self, semantic_match: &SemanticMatch) -> Removal {
        let mut graph = self.write();
        let Some(edges) = graph.get_mut(&semantic_match.base_semantic_id) else {
            return Removal::NotFound;
        };
        let Some(position) = edges.iter().position(|edge| edge == semantic_match) else {
            return Removal::NotFound;
        };
        edges.remove(position);
        if edges.is_empty() {
            graph.remove(&semantic_match.base_semantic_id);
        }
        Removal::Removed
    }

    /// Drop every stored edge.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// All matches reachable from `semantic_id` whose combined score is
    /// strictly greater than `score_limit`.
    ///
    /// Direct edges come back unchanged. Multi-hop results are rooted at
    /// `semantic_id`, carry the product of the scores along their path and
    /// list the intermediate identifiers under `path`. A limit of zero or
    /// below matches everything reachable.
    pub fn local_matches(&self, semantic_id: &str, score_limit: f64) -> Vec<SemanticMatch> {
        if score_limit.is_nan() {
            return Vec::new();
        }
        traversal::local_matches(&self.read(), semantic_id, score_limit, self.max_depth)
    }

    /// Outgoing edges stored for `semantic_id`.
    pub fn outgoing(&self, semantic_id: &str) -> Vec<SemanticMatch> {
        self.read().get(semantic_id).cloned().unwrap_or_default()
    }

    /// Copy of the whole graph.
    pub fn all_matches(&self) -> BTreeMap<String, Vec<SemanticMatch>> {
        self.read().clone()
    }

    /// Number of stored edges.
    pub fn len(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Number of identifiers with at least one outgoing edge.
    pub fn source_count(&self) -> usize {
        self.read().len()
    }
}

impl Default for EquivalenceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EquivalenceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EquivalenceTable")
            .field("sources", &self.source_count())
            .field("edges", &self.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

pub(crate) fn insert_edge(
    graph: &mut BTreeMap<String, Vec<SemanticMatch>>,
    semantic_match: SemanticMatch,
) -> bool {
    let edges = graph
        .entry(semantic_match.base_semantic_id.clone())
        .or_default();
    if edges.contains(&semantic_match) {
        return false;
    }
    edges.push(semantic_match);
    true
}
