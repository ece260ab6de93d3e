use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use seedbank_core::dedup_key;

use crate::atomic::write_json_atomic;
use crate::error::{StoreError, StoreResult};
use crate::index::PoolIndex;
use crate::layout::PoolLayout;
use crate::locks::LockRegistry;

/// Result of an append or rollover write.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// Absolute path of the pool file written.
    pub path: PathBuf,
    /// Records in the file after the write.
    pub total: usize,
    /// Records newly added by this write.
    pub added: usize,
}

/// Summary row for the pool listing endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolInfo {
    pub project_key: String,
    pub entity_type: String,
    pub files: usize,
    pub records: usize,
}

/// Durable pool storage rooted at one directory.
///
/// Cloning shares the lock registry, so every handle in the process
/// serializes writes to the same files.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    layout: PoolLayout,
    locks: LockRegistry,
}

impl DatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: PoolLayout::new(root),
            locks: LockRegistry::default(),
        }
    }

    pub fn layout(&self) -> &PoolLayout {
        &self.layout
    }

    /// Load the full pool for `(project_key, entity_type)`, or every
    /// entity of the project when `entity_type` is `None`.
    ///
    /// Files are concatenated in index order; unreadable or malformed
    /// files are skipped with a warning and never fail the read.
    pub fn load(&self, project_key: &str, entity_type: Option<&str>) -> Vec<Value> {
        let index = PoolIndex::read(&self.layout.index_path(project_key));
        let entities: Vec<String> = match entity_type {
            Some(entity) => vec![entity.to_string()],
            None => index.entity_types().map(str::to_string).collect(),
        };

        let mut records = Vec::new();
        for entity in &entities {
            for entry in index.files(entity) {
                let path = match self.layout.resolve_entry(project_key, entry) {
                    Ok(path) => path,
                    Err(err) => {
                        warn!(project = %project_key, entry = %entry, error = %err, "skipping bad index entry");
                        continue;
                    }
                };
                match read_array(&path) {
                    Ok(mut batch) => records.append(&mut batch),
                    Err(err) => {
                        warn!(project = %project_key, path = %path.display(), error = %err, "skipping unreadable pool file");
                    }
                }
            }
        }
        debug!(project = %project_key, entity = ?entity_type, records = records.len(), "pool loaded");
        records
    }

    /// First pool file for an entity, used as the example source for
    /// schema inference. `None` when the file is missing or malformed.
    pub fn load_primary(&self, project_key: &str, entity_type: &str) -> Option<Vec<Value>> {
        let path = self.layout.primary_file(project_key, entity_type);
        match read_array(&path) {
            Ok(records) => Some(records),
            Err(StoreError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                None
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "primary pool file unreadable");
                None
            }
        }
    }

    /// Merge `records` into the entity's primary file, deduplicating the
    /// combined list (first occurrence wins) and registering the file in
    /// the index. Holds the file's write lock for the whole
    /// read-merge-write cycle.
    pub async fn append(
        &self,
        project_key: &str,
        entity_type: &str,
        records: Vec<Value>,
    ) -> StoreResult<WriteOutcome> {
        let path = self.layout.primary_file(project_key, entity_type);
        let _guard = self.locks.acquire(&path).await;

        let existing = match read_array(&path) {
            Ok(existing) => existing,
            Err(StoreError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                Vec::new()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "existing pool file unreadable, rewriting");
                Vec::new()
            }
        };

        let before = existing.len();
        let merged = dedup(existing.into_iter().chain(records));
        let total = merged.len();
        let added = total.saturating_sub(before);
        write_json_atomic(&path, &merged)?;
        self.register_file(project_key, entity_type, &path).await?;

        info!(
            project = %project_key,
            entity = %entity_type,
            total,
            added,
            "pool appended"
        );
        Ok(WriteOutcome { path, total, added })
    }

    /// Write `records` to a fresh timestamped file and append it to the
    /// index, leaving earlier files untouched.
    pub async fn rollover(
        &self,
        project_key: &str,
        entity_type: &str,
        records: Vec<Value>,
    ) -> StoreResult<WriteOutcome> {
        let timestamp = chrono::Utc::now().timestamp();
        let path = self
            .layout
            .rollover_file(project_key, entity_type, timestamp);
        let _guard = self.locks.acquire(&path).await;

        let records = dedup(records.into_iter());
        let total = records.len();
        write_json_atomic(&path, &records)?;
        self.register_file(project_key, entity_type, &path).await?;

        info!(project = %project_key, entity = %entity_type, total, "pool rolled over");
        Ok(WriteOutcome {
            path,
            total,
            added: total,
        })
    }

    /// Enumerate every `(project, entity)` pool under the root.
    pub fn pools(&self) -> Vec<PoolInfo> {
        let mut pools = Vec::new();
        let entries = match std::fs::read_dir(self.layout.root()) {
            Ok(entries) => entries,
            Err(_) => return pools,
        };
        let mut projects: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        projects.sort();

        for project in projects {
            let index = PoolIndex::read(&self.layout.index_path(&project));
            for entity in index.entity_types() {
                pools.push(PoolInfo {
                    project_key: project.clone(),
                    entity_type: entity.to_string(),
                    files: index.files(entity).len(),
                    records: self.load(&project, Some(entity)).len(),
                });
            }
        }
        pools
    }

    async fn register_file(
        &self,
        project_key: &str,
        entity_type: &str,
        file: &Path,
    ) -> StoreResult<()> {
        let index_path = self.layout.index_path(project_key);
        let _guard = self.locks.acquire(&index_path).await;
        let mut index = PoolIndex::read(&index_path);
        if index.register(entity_type, self.layout.relative_entry(file)?) {
            index.write(&index_path)?;
        }
        Ok(())
    }
}

fn read_array(path: &Path) -> StoreResult<Vec<Value>> {
    let data = std::fs::read(path).map_err(|err| StoreError::io(path, err))?;
    match serde_json::from_slice::<Value>(&data)? {
        Value::Array(records) => Ok(records),
        _ => Err(StoreError::NotAnArray(path.to_path_buf())),
    }
}

fn dedup(records: impl Iterator<Item = Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for (index, record) in records.enumerate() {
        if seen.insert(dedup_key(&record, index)) {
            kept.push(record);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn movie(id: u32) -> Value {
        json!({"id": id, "title": format!("Movie {id}"), "category": "drama"})
    }

    #[tokio::test]
    async fn append_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        store
            .append("cinema", "movies", vec![movie(1), movie(2)])
            .await
            .unwrap();

        let pool = store.load("cinema", Some("movies"));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0]["id"], json!(1));
    }

    #[tokio::test]
    async fn append_is_idempotent_for_identified_records() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        let batch = vec![movie(1), movie(2), movie(3)];

        let first = store.append("cinema", "movies", batch.clone()).await.unwrap();
        let bytes_first = std::fs::read(&first.path).unwrap();

        let second = store.append("cinema", "movies", batch).await.unwrap();
        assert_eq!(second.added, 0);
        assert_eq!(second.total, 3);
        assert_eq!(std::fs::read(&second.path).unwrap(), bytes_first);
    }

    #[tokio::test]
    async fn dedup_falls_back_to_title_category() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        let record = json!({"title": "Solaris", "category": "scifi"});
        store
            .append("cinema", "movies", vec![record.clone(), record])
            .await
            .unwrap();
        assert_eq!(store.load("cinema", Some("movies")).len(), 1);
    }

    #[tokio::test]
    async fn rollover_appends_to_index_in_order() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        store
            .append("cinema", "movies", vec![movie(1)])
            .await
            .unwrap();
        store
            .rollover("cinema", "movies", vec![movie(9)])
            .await
            .unwrap();

        let index = PoolIndex::read(&store.layout().index_path("cinema"));
        let files = index.files("movies");
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], "./data/movies_1.json");

        let pool = store.load("cinema", Some("movies"));
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.last().unwrap()["id"], json!(9));
    }

    #[tokio::test]
    async fn load_skips_malformed_files() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        store
            .append("cinema", "movies", vec![movie(1)])
            .await
            .unwrap();
        store
            .rollover("cinema", "movies", vec![movie(2)])
            .await
            .unwrap();

        // Corrupt the primary file; the rollover file must still load.
        std::fs::write(store.layout().primary_file("cinema", "movies"), b"not json").unwrap();
        let pool = store.load("cinema", Some("movies"));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0]["id"], json!(2));
    }

    #[tokio::test]
    async fn corrupt_index_reads_empty_and_recovers_on_write() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        let index_path = store.layout().index_path("cinema");
        std::fs::create_dir_all(index_path.parent().unwrap()).unwrap();
        std::fs::write(&index_path, b"{ broken").unwrap();

        assert!(store.load("cinema", Some("movies")).is_empty());

        store
            .append("cinema", "movies", vec![movie(5)])
            .await
            .unwrap();
        assert_eq!(store.load("cinema", Some("movies")).len(), 1);
    }

    #[tokio::test]
    async fn load_without_entity_merges_all_pools() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        store
            .append("shop", "books", vec![json!({"id": "b1"})])
            .await
            .unwrap();
        store
            .append("shop", "authors", vec![json!({"id": "a1"})])
            .await
            .unwrap();
        assert_eq!(store.load("shop", None).len(), 2);
    }

    #[tokio::test]
    async fn pools_lists_projects_and_sizes() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        store
            .append("cinema", "movies", vec![movie(1), movie(2)])
            .await
            .unwrap();
        store
            .append("shop", "books", vec![json!({"id": "b1"})])
            .await
            .unwrap();

        let pools = store.pools();
        assert_eq!(pools.len(), 2);
        let cinema = pools
            .iter()
            .find(|p| p.project_key == "cinema")
            .unwrap();
        assert_eq!(cinema.entity_type, "movies");
        assert_eq!(cinema.records, 2);
        assert_eq!(cinema.files, 1);
    }

    #[tokio::test]
    async fn load_primary_reports_missing_pool() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::new(dir.path());
        assert!(store.load_primary("cinema", "movies").is_none());
        store
            .append("cinema", "movies", vec![movie(1)])
            .await
            .unwrap();
        assert_eq!(store.load_primary("cinema", "movies").unwrap().len(), 1);
    }
}
