use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::atomic::write_json_atomic;
use crate::error::StoreResult;

/// The `main.json` index: entity type -> ordered relative file paths.
///
/// A missing or unparseable index reads as empty; writes always replace
/// the whole document, so bad index state never blocks a writer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl PoolIndex {
    pub fn read(path: &Path) -> Self {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(_) => return Self::default(),
        };
        match serde_json::from_slice(&data) {
            Ok(index) => index,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "corrupt pool index, treating as empty");
                Self::default()
            }
        }
    }

    pub fn write(&self, path: &Path) -> StoreResult<()> {
        write_json_atomic(path, self)
    }

    pub fn files(&self, entity_type: &str) -> &[String] {
        self.entries
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register `entry` for `entity_type` unless it is already listed.
    /// Returns whether the index changed.
    pub fn register(&mut self, entity_type: &str, entry: String) -> bool {
        let files = self.entries.entry(entity_type.to_string()).or_default();
        if files.contains(&entry) {
            return false;
        }
        files.push(entry);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_preserves_order_and_dedups() {
        let mut index = PoolIndex::default();
        assert!(index.register("movies", "./data/movies_1.json".into()));
        assert!(index.register("movies", "./data/movies_170000.json".into()));
        assert!(!index.register("movies", "./data/movies_1.json".into()));
        assert_eq!(
            index.files("movies"),
            [
                "./data/movies_1.json".to_string(),
                "./data/movies_170000.json".to_string()
            ]
        );
    }

    #[test]
    fn missing_index_reads_empty() {
        let index = PoolIndex::read(Path::new("/nonexistent/main.json"));
        assert!(index.is_empty());
    }
}
