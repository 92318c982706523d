use super::*;
use serde_json::json;
use std::sync::Arc;
use std::thread;

use crate::types::PATH_KEY;

const ONE: &str = "s-heppner.com/semanticID/one";
const TWO: &str = "s-heppner.com/semanticID/two";
const ID_1: &str = "s-heppner.com/semanticID/1";
const ID_2: &str = "s-heppner.com/semanticID/2";
const SOURCE: &str = "Defined by Sebastian Heppner";

fn edge(base: &str, target: &str, score: f64) -> SemanticMatch {
    SemanticMatch::new(base, target, score).with_match_source(SOURCE)
}

fn example_table() -> EquivalenceTable {
    let table = EquivalenceTable::new();
    table.add(edge(ONE, ID_1, 1.0)).unwrap();
    table.add(edge(TWO, ID_2, 1.0)).unwrap();
    table.add(edge(ONE, TWO, 0.8)).unwrap();
    table
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn example_table_at_half_returns_direct_and_derived_matches() {
    let table = example_table();

    let matches = table.local_matches(ONE, 0.5);

    assert_eq!(
        matches,
        vec![
            edge(ONE, ID_1, 1.0),
            edge(ONE, TWO, 0.8),
            edge(ONE, ID_2, 0.8).with_meta(PATH_KEY, json!([TWO])),
        ]
    );
}

#[test]
fn example_table_at_point_nine_returns_only_exact_edge() {
    let table = example_table();

    let matches = table.local_matches(ONE, 0.9);

    assert_eq!(matches, vec![edge(ONE, ID_1, 1.0)]);
}

#[test]
fn unknown_identifier_has_no_matches() {
    let table = example_table();
    assert!(table.local_matches("s-heppner.com/semanticID/unknown", 0.5).is_empty());
    assert!(table.local_matches(ID_1, 0.0).is_empty());
}

#[test]
fn score_equal_to_limit_is_excluded() {
    let table = EquivalenceTable::new();
    table.add(SemanticMatch::new("a/x", "a/y", 0.5)).unwrap();
    table.add(SemanticMatch::new("a/y", "a/z", 0.5)).unwrap();

    assert!(table.local_matches("a/x", 0.5).is_empty());
    // 0.5 * 0.5 == 0.25 is not strictly above 0.25
    let matches = table.local_matches("a/x", 0.25);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].match_semantic_id, "a/y");
}

#[test]
fn multi_hop_score_is_product_of_path() {
    let table = EquivalenceTable::new();
    table.add(SemanticMatch::new("a/0", "a/1", 0.9)).unwrap();
    table.add(SemanticMatch::new("a/1", "a/2", 0.8)).unwrap();
    table.add(SemanticMatch::new("a/2", "a/3", 0.7)).unwrap();
    table.add(SemanticMatch::new("a/3", "a/4", 0.95)).unwrap();

    let matches = table.local_matches("a/0", 0.0);

    assert_eq!(matches.len(), 4);
    let last = matches.last().unwrap();
    assert_eq!(last.base_semantic_id, "a/0");
    assert_eq!(last.match_semantic_id, "a/4");
    assert_close(last.score, 0.9 * 0.8 * 0.7 * 0.95);
    assert_eq!(last.path(), vec!["a/1", "a/2", "a/3"]);
}

#[test]
fn results_never_at_or_below_limit() {
    let table = EquivalenceTable::new();
    let scores = [0.95, 0.6, 0.85, 0.7, 0.99, 0.5];
    let ids = ["a/a", "a/b", "a/c", "a/d", "a/e", "a/f", "a/g"];
    for (i, score) in scores.iter().enumerate() {
        table.add(SemanticMatch::new(ids[i], ids[i + 1], *score)).unwrap();
        table.add(SemanticMatch::new(ids[0], ids[i + 1], *score)).unwrap();
    }

    for limit in [0.0, 0.3, 0.5, 0.6, 0.8, 0.95] {
        for found in table.local_matches("a/a", limit) {
            assert!(found.score > limit, "{} <= {limit}", found.score);
            assert_eq!(found.base_semantic_id, "a/a");
        }
    }
}

#[test]
fn path_lists_intermediates_excluding_target() {
    let table = EquivalenceTable::new();
    table.add(SemanticMatch::new("a/root", "b/mid", 1.0)).unwrap();
    table.add(SemanticMatch::new("b/mid", "c/leaf", 1.0)).unwrap();

    let matches = table.local_matches("a/root", 0.5);

    assert!(matches[0].meta_information.get(PATH_KEY).is_none());
    assert_eq!(matches[1].path(), vec!["b/mid"]);
    assert!(!matches[1].path().contains(&matches[1].match_semantic_id));
}

#[test]
fn derived_match_keeps_final_edge_meta_and_existing_path() {
    let table = EquivalenceTable::new();
    table.add(SemanticMatch::new("a/root", "a/mid", 1.0)).unwrap();
    table
        .add(
            SemanticMatch::new("a/mid", "a/leaf", 1.0)
                .with_match_source("imported")
                .with_meta(PATH_KEY, json!(["a/hidden"])),
        )
        .unwrap();

    let matches = table.local_matches("a/root", 0.5);

    assert_eq!(matches[1].match_source(), Some("imported"));
    assert_eq!(matches[1].path(), vec!["a/mid", "a/hidden"]);
}

#[test]
fn traversal_does_not_mutate_stored_edges() {
    let table = example_table();
    let before = table.all_matches();

    let _ = table.local_matches(ONE, 0.0);
    let _ = table.local_matches(ONE, 0.0);

    assert_eq!(table.all_matches(), before);
}

#[test]
fn cycle_of_exact_edges_terminates() {
    let table = EquivalenceTable::new();
    table.add(SemanticMatch::new("a/x", "a/y", 1.0)).unwrap();
    table.add(SemanticMatch::new("a/y", "a/z", 1.0)).unwrap();
    table.add(SemanticMatch::new("a/z", "a/x", 1.0)).unwrap();

    let matches = table.local_matches("a/x", 0.5);

    let targets: Vec<_> = matches.iter().map(|m| m.match_semantic_id.as_str()).collect();
    assert_eq!(targets, vec!["a/y", "a/z"]);
}

#[test]
fn cycle_with_non_positive_limit_terminates() {
    let table = EquivalenceTable::new();
    table.add(SemanticMatch::new("a/x", "a/y", 0.5)).unwrap();
    table.add(SemanticMatch::new("a/y", "a/x", 0.5)).unwrap();
    table.add(SemanticMatch::new("a/y", "a/y", 0.9)).unwrap();

    let matches = table.local_matches("a/x", -1.0);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].match_semantic_id, "a/y");
}

#[test]
fn diamond_reports_both_edges_into_shared_node() {
    let table = EquivalenceTable::new();
    table.add(SemanticMatch::new("a/top", "a/left", 0.9)).unwrap();
    table.add(SemanticMatch::new("a/top", "a/right", 0.8)).unwrap();
    table.add(SemanticMatch::new("a/left", "a/bottom", 0.9)).unwrap();
    table.add(SemanticMatch::new("a/right", "a/bottom", 0.9)).unwrap();

    let matches = table.local_matches("a/top", 0.0);

    let bottoms: Vec<_> = matches
        .iter()
        .filter(|m| m.match_semantic_id == "a/bottom")
        .collect();
    assert_eq!(bottoms.len(), 2);
    assert_close(bottoms[0].score, 0.81);
    assert_eq!(bottoms[0].path(), vec!["a/left"]);
    assert_close(bottoms[1].score, 0.72);
    assert_eq!(bottoms[1].path(), vec!["a/right"]);
}

#[test]
fn shared_node_is_entered_once_per_improvement() {
    let table = EquivalenceTable::new();
    table.add(SemanticMatch::new("a/top", "a/left", 0.9)).unwrap();
    table.add(SemanticMatch::new("a/top", "a/right", 0.8)).unwrap();
    table.add(SemanticMatch::new("a/left", "a/bottom", 0.9)).unwrap();
    table.add(SemanticMatch::new("a/right", "a/bottom", 0.9)).unwrap();
    table.add(SemanticMatch::new("a/bottom", "a/end", 1.0)).unwrap();

    let matches = table.local_matches("a/top", 0.0);
    let ends: Vec<_> = matches
        .iter()
        .filter(|m| m.match_semantic_id == "a/end")
        .collect();
    assert_eq!(ends.len(), 1);
    assert_close(ends[0].score, 0.81);
    assert_eq!(ends[0].path(), vec!["a/left", "a/bottom"]);

    // The weaker branch is walked first; the stronger one re-enters the node.
    let table = EquivalenceTable::new();
    table.add(SemanticMatch::new("a/top", "a/right", 0.8)).unwrap();
    table.add(SemanticMatch::new("a/top", "a/left", 0.9)).unwrap();
    table.add(SemanticMatch::new("a/right", "a/bottom", 0.9)).unwrap();
    table.add(SemanticMatch::new("a/left", "a/bottom", 0.9)).unwrap();
    table.add(SemanticMatch::new("a/bottom", "a/end", 1.0)).unwrap();

    let matches = table.local_matches("a/top", 0.0);
    let end_scores: Vec<_> = matches
        .iter()
        .filter(|m| m.match_semantic_id == "a/end")
        .map(|m| m.score)
        .collect();
    assert_eq!(end_scores.len(), 2);
    assert_close(end_scores[0], 0.72);
    assert_close(end_scores[1], 0.81);
}

#[test]
fn synonym_clique_stays_polynomial() {
    let n = 12;
    let table = EquivalenceTable::new();
    for i in 0..n {
        for j in 0..n {
            if i != j {
                table
                    .add(SemanticMatch::new(format!("a.com/{i}"), format!("a.com/{j}"), 1.0))
                    .unwrap();
            }
        }
    }

    let matches = table.local_matches("a.com/0", 0.5);

    assert!(matches.len() <= n * (n - 1), "{} results", matches.len());
    let targets: std::collections::BTreeSet<_> =
        matches.iter().map(|m| m.match_semantic_id.as_str()).collect();
    assert_eq!(targets.len(), n - 1);
    assert!(!targets.contains("a.com/0"));
    assert!(matches.iter().all(|m| m.base_semantic_id == "a.com/0"));
}

#[test]
fn stored_self_loop_is_reported_but_not_followed() {
    let table = EquivalenceTable::new();
    table.add(SemanticMatch::new("a.com/x", "a.com/x", 1.0)).unwrap();
    table.add(SemanticMatch::new("a.com/x", "a.com/y", 0.9)).unwrap();
    table.add(SemanticMatch::new("a.com/y", "a.com/x", 0.9)).unwrap();

    let matches = table.local_matches("a.com/x", 0.5);

    assert_eq!(
        matches,
        vec![
            SemanticMatch::new("a.com/x", "a.com/x", 1.0),
            SemanticMatch::new("a.com/x", "a.com/y", 0.9),
        ]
    );
    assert!(table.local_matches("a.com/x", 1.0).is_empty());
}

#[test]
fn max_depth_caps_path_length() {
    let table = EquivalenceTable::new().with_max_depth(2);
    for i in 0..5 {
        table
            .add(SemanticMatch::new(format!("a/{i}"), format!("a/{}", i + 1), 1.0))
            .unwrap();
    }

    let matches = table.local_matches("a/0", 0.0);

    let targets: Vec<_> = matches.iter().map(|m| m.match_semantic_id.as_str()).collect();
    assert_eq!(targets, vec!["a/1", "a/2"]);
}

#[test]
fn nan_limit_matches_nothing() {
    let table = example_table();
    assert!(table.local_matches(ONE, f64::NAN).is_empty());
}

#[test]
fn add_is_idempotent() {
    let table = example_table();
    let before = table.all_matches();

    let inserted = table.add(edge(ONE, ID_1, 1.0)).unwrap();

    assert!(!inserted);
    assert_eq!(table.all_matches(), before);
}

#[test]
fn edges_differing_only_in_meta_are_distinct() {
    let table = EquivalenceTable::new();
    assert!(table.add(SemanticMatch::new("a/x", "a/y", 0.5)).unwrap());
    assert!(table
        .add(SemanticMatch::new("a/x", "a/y", 0.5).with_match_source("other"))
        .unwrap());
    assert_eq!(table.len(), 2);
}

#[test]
fn add_then_remove_restores_prior_state() {
    let table = example_table();
    let before = table.all_matches();
    let fresh = edge(TWO, "s-heppner.com/semanticID/deux", 0.7);

    assert!(table.add(fresh.clone()).unwrap());
    assert_ne!(table.all_matches(), before);
    assert_eq!(table.remove(&fresh), Removal::Removed);

    assert_eq!(table.all_matches(), before);
}

#[test]
fn removing_last_edge_deletes_key() {
    let table = example_table();

    assert!(table.remove(&edge(TWO, ID_2, 1.0)).is_removed());

    let all = table.all_matches();
    assert!(!all.contains_key(TWO));
    assert!(all.values().all(|edges| !edges.is_empty()));
}

#[test]
fn removing_missing_edge_is_reported() {
    let table = example_table();
    let before = table.all_matches();

    assert_eq!(table.remove(&edge(ONE, ID_1, 0.5)), Removal::NotFound);
    assert_eq!(
        table.remove(&edge("s-heppner.com/semanticID/none", ID_1, 1.0)),
        Removal::NotFound
    );
    assert_eq!(table.all_matches(), before);
}

#[test]
fn add_rejects_invalid_score() {
    let table = EquivalenceTable::new();
    let err = table
        .add(SemanticMatch::new("a/x", "a/y", 1.5))
        .expect_err("score above one");
    assert!(matches!(err, TableError::InvalidMatch(_)));
    assert!(table.is_empty());
}

#[test]
fn add_all_is_all_or_nothing() {
    let table = EquivalenceTable::new();
    let batch = vec![
        SemanticMatch::new("a/x", "a/y", 0.5),
        SemanticMatch::new("a/x", "a/z", 0.0),
    ];

    assert!(table.add_all(batch).is_err());
    assert!(table.is_empty());

    let inserted = table
        .add_all(vec![
            SemanticMatch::new("a/x", "a/y", 0.5),
            SemanticMatch::new("a/x", "a/y", 0.5),
        ])
        .unwrap();
    assert_eq!(inserted, 1);
}

#[test]
fn clear_empties_table() {
    let table = example_table();
    table.clear();
    assert!(table.all_matches().is_empty());
    assert!(table.is_empty());
    assert_eq!(table.len(), 0);
}

#[test]
fn concurrent_readers_and_writers_see_whole_sequences() {
    let table = Arc::new(example_table());

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for i in 0..200 {
                    let e = SemanticMatch::new(format!("w/{t}"), format!("w/{t}-{i}"), 0.9);
                    table.add(e.clone()).unwrap();
                    assert!(table.remove(&e).is_removed());
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                for _ in 0..200 {
                    assert_eq!(table.local_matches(ONE, 0.5).len(), 3);
                    assert!(table.all_matches().values().all(|edges| !edges.is_empty()));
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }
    assert_eq!(table.all_matches(), example_table().all_matches());
}
