use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by pool storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("pool file {0} is not a JSON array")]
    NotAnArray(PathBuf),
    #[error("invalid pool path: {0}")]
    InvalidPath(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for results returned by the storage layer.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
