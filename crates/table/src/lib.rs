//! # Equivalence Table (`table`)
//!
//! ## Purpose
//!
//! `table` owns the locally known semantic equivalences: a directed, weighted
//! multi-edge graph keyed by source identifier. It answers one question
//! quickly and without I/O: which identifiers can be reached from a given
//! identifier with a combined confidence above some threshold?
//!
//! Scores compose multiplicatively along a path, so `a -0.8-> b -0.9-> c`
//! yields a derived match `a -> c` with score `0.72` and `path = [b]`.
//!
//! ## Core Types
//!
//! - [`SemanticMatch`]: one edge (or one derived match).
//! - [`EquivalenceTable`]: the shared graph with add/remove/clear and
//!   [`EquivalenceTable::local_matches`].
//! - [`Removal`]: explicit found/not-found outcome of a removal.
//! - [`TableSnapshot`]: the serializable image used for persistence.
//!
//! ## Example Usage
//!
//! ```
//! use table::{EquivalenceTable, SemanticMatch};
//!
//! let table = EquivalenceTable::new();
//! table.add(SemanticMatch::new("s-heppner.com/semanticID/one", "s-heppner.com/semanticID/two", 0.8)).unwrap();
//! table.add(SemanticMatch::new("s-heppner.com/semanticID/two", "s-heppner.com/semanticID/2", 1.0)).unwrap();
//!
//! let matches = table.local_matches("s-heppner.com/semanticID/one", 0.5);
//! assert_eq!(matches.len(), 2);
//! assert_eq!(matches[1].match_semantic_id, "s-heppner.com/semanticID/2");
//! assert_eq!(matches[1].path(), vec!["s-heppner.com/semanticID/two"]);
//! ```

mod snapshot;
mod table;
mod traversal;
pub mod types;

pub use crate::snapshot::TableSnapshot;
pub use crate::table::{EquivalenceTable, Removal, DEFAULT_MAX_DEPTH};
pub use crate::types::{
    MetaInformation, SemanticMatch, TableError, MATCH_SOURCE_KEY, PATH_KEY,
};
