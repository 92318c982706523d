use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Reserved `meta_information` key holding free-text provenance.
pub const MATCH_SOURCE_KEY: &str = "matchSource";
/// Reserved `meta_information` key holding the intermediate hops of a derived match.
pub const PATH_KEY: &str = "path";

/// Open key/value annotations carried by a [`SemanticMatch`].
pub type MetaInformation = Map<String, JsonValue>;

/// A directed, weighted equivalence edge:
/// `base_semantic_id` ---`score`---> `match_semantic_id`.
///
/// The same record describes both stored edges and derived multi-hop matches.
/// A derived match is rooted at the queried identifier, carries the product of
/// the scores along its path, and lists the intermediate identifiers under
/// [`PATH_KEY`] in root-to-target order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticMatch {
    /// Source identifier.
    pub base_semantic_id: String,
    /// Target identifier.
    pub match_semantic_id: String,
    /// Confidence in (0, 1] that source and target denote the same concept.
    pub score: f64,
    /// Provenance and path annotations.
    #[serde(default)]
    pub meta_information: MetaInformation,
}

impl SemanticMatch {
    pub fn new(
        base_semantic_id: impl Into<String>,
        match_semantic_id: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            base_semantic_id: base_semantic_id.into(),
            match_semantic_id: match_semantic_id.into(),
            score,
            meta_information: MetaInformation::new(),
        }
    }

    /// Attach a `matchSource` annotation.
    pub fn with_match_source(self, source: impl Into<String>) -> Self {
        self.with_meta(MATCH_SOURCE_KEY, JsonValue::String(source.into()))
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.meta_information.insert(key.into(), value);
        self
    }

    pub fn match_source(&self) -> Option<&str> {
        self.meta_information
            .get(MATCH_SOURCE_KEY)
            .and_then(JsonValue::as_str)
    }

    /// Intermediate hops recorded under `path`, or an empty list for direct edges.
    pub fn path(&self) -> Vec<String> {
        self.meta_information
            .get(PATH_KEY)
            .and_then(JsonValue::as_array)
            .map(|hops| {
                hops.iter()
                    .filter_map(|hop| hop.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check the stored-edge invariants: non-blank identifiers and a finite
    /// score in (0, 1].
    pub fn validate(&self) -> Result<(), TableError> {
        if self.base_semantic_id.trim().is_empty() {
            return Err(TableError::InvalidMatch(
                "base_semantic_id must not be empty".into(),
            ));
        }
        if self.match_semantic_id.trim().is_empty() {
            return Err(TableError::InvalidMatch(
                "match_semantic_id must not be empty".into(),
            ));
        }
        if !self.score.is_finite() || self.score <= 0.0 || self.score > 1.0 {
            return Err(TableError::InvalidMatch(format!(
                "score must lie in (0, 1], got {} for {} -> {}",
                self.score, self.base_semantic_id, self.match_semantic_id
            )));
        }
        Ok(())
    }

    /// Re-express this match as reached from `root`.
    ///
    /// `prefix_score` is the product of the edges walked before this one and
    /// `hops` the identifiers entered on the way, nearest-to-root first. The
    /// hops are put in front of any `path` already present.
    pub fn rerooted(&self, root: &str, prefix_score: f64, hops: &[String]) -> SemanticMatch {
        let mut derived = self.clone();
        derived.base_semantic_id = root.to_owned();
        derived.score = prefix_score * self.score;
        if !hops.is_empty() {
            derived.prepend_path(hops);
        }
        derived
    }

    /// Compose a match reported for `via.match_semantic_id` onto the edge
    /// `via`, so the result is rooted at `via.base_semantic_id`.
    pub fn composed_onto(&self, via: &SemanticMatch) -> SemanticMatch {
        let mut hops = via.path();
        hops.push(via.match_semantic_id.clone());
        self.rerooted(&via.base_semantic_id, via.score, &hops)
    }

    fn prepend_path(&mut self, hops: &[String]) {
        let mut path: Vec<JsonValue> = hops.iter().cloned().map(JsonValue::String).collect();
        if let Some(JsonValue::Array(existing)) = self.meta_information.remove(PATH_KEY) {
            path.extend(existing);
        }
        self.meta_information
            .insert(PATH_KEY.to_owned(), JsonValue::Array(path));
    }
}

/// Errors produced by the equivalence table.
#[derive(Debug, Error)]
pub enum TableError {
    /// An edge violates the stored-edge invariants.
    #[error("invalid semantic match: {0}")]
    InvalidMatch(String),
    /// Reading or writing a snapshot file failed.
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    /// A snapshot could not be encoded or decoded.
    #[error("snapshot format error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_rejects_out_of_range_scores() {
        for score in [0.0, -0.5, 1.01, f64::NAN, f64::INFINITY] {
            let edge = SemanticMatch::new("a/x", "a/y", score);
            let err = edge.validate().expect_err("score should be rejected");
            assert!(err.to_string().contains("score"), "{err}");
        }
        assert!(SemanticMatch::new("a/x", "a/y", 1.0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_identifiers() {
        let err = SemanticMatch::new(" ", "a/y", 0.5)
            .validate()
            .expect_err("blank base should be rejected");
        assert!(err.to_string().contains("base_semantic_id"));

        let err = SemanticMatch::new("a/x", "", 0.5)
            .validate()
            .expect_err("blank target should be rejected");
        assert!(err.to_string().contains("match_semantic_id"));
    }

    #[test]
    fn meta_information_defaults_when_absent() {
        let edge: SemanticMatch = serde_json::from_value(json!({
            "base_semantic_id": "a/x",
            "match_semantic_id": "a/y",
            "score": 0.5
        }))
        .unwrap();
        assert!(edge.meta_information.is_empty());
        assert!(edge.path().is_empty());
    }

    #[test]
    fn composed_onto_keeps_root_to_target_order() {
        let via = SemanticMatch::new("a/root", "b/mid", 0.9)
            .with_meta(PATH_KEY, json!(["a/first"]));
        let remote = SemanticMatch::new("b/mid", "c/leaf", 0.5)
            .with_match_source("peer")
            .with_meta(PATH_KEY, json!(["b/inner"]));

        let composed = remote.composed_onto(&via);

        assert_eq!(composed.base_semantic_id, "a/root");
        assert_eq!(composed.match_semantic_id, "c/leaf");
        assert!((composed.score - 0.45).abs() < 1e-12);
        assert_eq!(composed.path(), vec!["a/first", "b/mid", "b/inner"]);
        assert_eq!(composed.match_source(), Some("peer"));
    }
}
