//! Snapshot persistence for the equivalence table.
//!
//! On disk a snapshot is a pretty-printed JSON document
//! `{"matches": {sourceId: [edge, ...]}}`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::table::{insert_edge, EquivalenceTable};
use crate::types::{SemanticMatch, TableError};

/// Serializable image of an [`EquivalenceTable`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableSnapshot {
    #[serde(default)]
    pub matches: BTreeMap<String, Vec<SemanticMatch>>,
}

impl TableSnapshot {
    /// Every edge must be valid and filed under its own base identifier.
    pub fn validate(&self) -> Result<(), TableError> {
        for (source, edges) in &self.matches {
            for edge in edges {
                edge.validate()?;
                if &edge.base_semantic_id != source {
                    return Err(TableError::InvalidMatch(format!(
                        "edge {} -> {} filed under {source}",
                        edge.base_semantic_id, edge.match_semantic_id
                    )));
                }
            }
        }
        Ok(())
    }
}

impl EquivalenceTable {
    pub fn to_snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            matches: self.all_matches(),
        }
    }

    pub fn from_snapshot(snapshot: TableSnapshot) -> Result<Self, TableError> {
        let table = Self::new();
        table.restore(snapshot)?;
        Ok(table)
    }

    /// Replace the table contents with `snapshot`.
    ///
    /// The snapshot is validated first; on error the table is left untouched.
    /// Duplicate edges collapse and empty sequences are dropped.
    pub fn restore(&self, snapshot: TableSnapshot) -> Result<(), TableError> {
        snapshot.validate()?;
        let mut restored = BTreeMap::new();
        for edge in snapshot.matches.into_values().flatten() {
            insert_edge(&mut restored, edge);
        }
        *self.write() = restored;
        Ok(())
    }

    /// Read a snapshot file into a new table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let snapshot: TableSnapshot = serde_json::from_slice(&bytes)?;
        let table = Self::from_snapshot(snapshot)?;
        tracing::info!(
            path = %path.display(),
            sources = table.source_count(),
            edges = table.len(),
            "equivalence table loaded"
        );
        Ok(table)
    }

    /// Write the current contents to `path`.
    ///
    /// The document goes to a sibling temp file which is then renamed over
    /// `path`, so readers never see a partial file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(&self.to_snapshot())?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), "equivalence table saved");
        Ok(())
    }
}
