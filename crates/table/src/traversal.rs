//! Transitive closure over the equivalence graph.
//!
//! Every path leaving the root whose score product stays strictly above the
//! caller's limit is flattened into a virtual direct edge rooted at the query.
//! Descending through an edge relaxes the limit to `limit / edge.score`, so a
//! deeper edge passes exactly when the product of the whole path passes the
//! original limit.
//!
//! The walk uses an explicit stack instead of recursion and only follows
//! simple paths: an edge leading back to the root or to an identifier already
//! on the current path is not followed, and is only reported when it is a
//! direct edge of the root (a stored self-loop). Path length is capped by
//! `max_depth`.
//!
//! An identifier is entered again only when it is reached with a strictly
//! higher path score than on any earlier visit. Every edge leaving an entered
//! identifier is still reported, so each reachable identifier appears with
//! its best path score, while densely connected synonym sets stay polynomial.
//! Results come out in depth-first pre-order: each edge is followed by
//! everything derived through it.

use std::collections::{BTreeMap, HashMap};

use crate::types::SemanticMatch;

struct Frame<'a> {
    edges: &'a [SemanticMatch],
    next: usize,
    /// Limit an edge leaving this node must beat.
    limit: f64,
    /// Product of the edges walked from the root to this node.
    score: f64,
}

pub(crate) fn local_matches(
    graph: &BTreeMap<String, Vec<SemanticMatch>>,
    root: &str,
    score_limit: f64,
    max_depth: usize,
) -> Vec<SemanticMatch> {
    let mut results = Vec::new();
    let Some(edges) = graph.get(root) else {
        return results;
    };

    // hops[i] is the node entered by stack[i + 1]
    let mut hops: Vec<String> = Vec::new();
    // Best path score with which each identifier was entered
    let mut best: HashMap<&str, f64> = HashMap::new();
    let mut stack = vec![Frame {
        edges,
        next: 0,
        limit: score_limit,
        score: 1.0,
    }];

    while let Some(frame) = stack.last_mut() {
        let edges = frame.edges;
        let Some(edge) = edges.get(frame.next) else {
            stack.pop();
            if !stack.is_empty() {
                hops.pop();
            }
            continue;
        };
        frame.next += 1;

        if edge.score <= frame.limit {
            continue;
        }
        let target = edge.match_semantic_id.as_str();
        if target == root || hops.iter().any(|hop| hop == target) {
            if stack.len() == 1 {
                results.push(edge.clone());
            } else {
                tracing::trace!(root, target, "skipping cyclic edge");
            }
            continue;
        }

        let prefix_score = frame.score;
        let reached = prefix_score * edge.score;
        let next_limit = frame.limit / edge.score;
        results.push(edge.rerooted(root, prefix_score, &hops));

        if stack.len() >= max_depth {
            continue;
        }
        if best.get(target).is_some_and(|&seen| reached <= seen) {
            continue;
        }
        if let Some(next_edges) = graph.get(target) {
            best.insert(target, reached);
            hops.push(target.to_owned());
            stack.push(Frame {
                edges: next_edges,
                next: 0,
                limit: next_limit,
                score: reached,
            });
        }
    }

    tracing::trace!(
        root,
        score_limit,
        matches = results.len(),
        "local traversal complete"
    );
    results
}
