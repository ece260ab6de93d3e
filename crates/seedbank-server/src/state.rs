use std::sync::Arc;

use sqlx::PgPool;

use seedbank_generate::{CompletionBackend, Generator};
use seedbank_store::DatasetStore;

use crate::config::Config;
use crate::error::ApiError;

/// Shared handler state. Cloning is cheap; the store clone shares the
/// process-wide file lock registry.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Option<PgPool>,
    pub store: DatasetStore,
    pub generator: Option<Generator>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Option<PgPool>,
        store: DatasetStore,
        backend: Option<Arc<dyn CompletionBackend>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db,
            store,
            generator: backend.map(Generator::new),
        }
    }

    /// The database pool, or 503 when none is configured.
    pub fn db(&self) -> Result<&PgPool, ApiError> {
        self.db.as_ref().ok_or(ApiError::DatabaseUnavailable)
    }

    /// The generation pipeline, or 500 when no API key is configured.
    pub fn generator(&self) -> Result<&Generator, ApiError> {
        self.generator
            .as_ref()
            .ok_or_else(|| ApiError::Generation("OPENAI_API_KEY is not set".to_string()))
    }
}
