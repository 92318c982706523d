//! Workspace umbrella crate for the semantic matching service.
//!
//! Re-exports the equivalence table, namespace resolution, the federated
//! matching engine and the HTTP server so callers depend on one crate.

pub use matcher::{
    FederationConfig, FederationSummary, HttpPeerClient, MatchError, MatchRequest, MatchResponse,
    MatchingService, MatchesList, PeerClient, PeerError,
};
pub use resolver::{
    namespace_of, Endpoint, HttpResolver, Resolution, Resolver, StaticResolver, UnresolvedReason,
};
pub use server::{build_router, start_server, ServerConfig, ServerState};
pub use table::{
    EquivalenceTable, Removal, SemanticMatch, TableError, TableSnapshot, DEFAULT_MAX_DEPTH,
};

/// Edges of the small demo table:
/// `one -1.0-> 1`, `two -1.0-> 2`, `one -0.8-> two`.
pub fn example_matches() -> Vec<SemanticMatch> {
    const SOURCE: &str = "Defined by Sebastian Heppner";
    vec![
        SemanticMatch::new("s-heppner.com/semanticID/one", "s-heppner.com/semanticID/1", 1.0)
            .with_match_source(SOURCE),
        SemanticMatch::new("s-heppner.com/semanticID/two", "s-heppner.com/semanticID/2", 1.0)
            .with_match_source(SOURCE),
        SemanticMatch::new("s-heppner.com/semanticID/one", "s-heppner.com/semanticID/two", 0.8)
            .with_match_source(SOURCE),
    ]
}

/// A table holding [`example_matches`].
pub fn example_table() -> Result<EquivalenceTable, TableError> {
    EquivalenceTable::from_matches(example_matches())
}
