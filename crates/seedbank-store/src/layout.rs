use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// Path conventions for one pool root.
#[derive(Debug, Clone)]
pub struct PoolLayout {
    root: PathBuf,
}

impl PoolLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_dir(&self, project_key: &str) -> PathBuf {
        self.root.join(project_key)
    }

    pub fn index_path(&self, project_key: &str) -> PathBuf {
        self.project_dir(project_key).join("main.json")
    }

    pub fn data_dir(&self, project_key: &str) -> PathBuf {
        self.project_dir(project_key).join("data")
    }

    /// The primary pool file for an entity, target of append writes.
    pub fn primary_file(&self, project_key: &str, entity_type: &str) -> PathBuf {
        self.data_dir(project_key)
            .join(format!("{entity_type}_1.json"))
    }

    /// A rollover pool file stamped with a unix timestamp.
    pub fn rollover_file(&self, project_key: &str, entity_type: &str, timestamp: i64) -> PathBuf {
        self.data_dir(project_key)
            .join(format!("{entity_type}_{timestamp}.json"))
    }

    /// Index entries reference files relative to the project directory,
    /// always in `./data/<file>` form.
    pub fn relative_entry(&self, file: &Path) -> StoreResult<String> {
        let name = file
            .file_name()
            .ok_or_else(|| StoreError::InvalidPath(file.display().to_string()))?;
        Ok(format!("./data/{}", name.to_string_lossy()))
    }

    /// Resolve an index entry back to an absolute path, rejecting entries
    /// that try to escape the project directory.
    pub fn resolve_entry(&self, project_key: &str, entry: &str) -> StoreResult<PathBuf> {
        let trimmed = entry.trim_start_matches("./");
        if trimmed.split('/').any(|part| part == "..") {
            return Err(StoreError::InvalidPath(entry.to_string()));
        }
        Ok(self.project_dir(project_key).join(trimmed))
    }
}
