//! Orchestration of one generation request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::info;

use crate::backend::{CompletionBackend, DEFAULT_TIMEOUT, SMART_TIMEOUT};
use crate::errors::GenerationError;
use crate::extract::parse_records;
use crate::model::{GenerationRequest, MAX_COUNT, SMART_MAX_COUNT, clamp_count};
use crate::prompt::build_prompt;
use crate::validate::validate_records;

/// Generated records plus elapsed wall time.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub records: Vec<Value>,
    pub elapsed: Duration,
}

/// Drives prompt building, submission, extraction, and validation for a
/// single request. No retries: failures propagate to the caller.
#[derive(Clone)]
pub struct Generator {
    backend: Arc<dyn CompletionBackend>,
}

impl Generator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Standard path: count clamped to `[1, 200]`, 60 s timeout.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.run(request, clamp_count(request.count, MAX_COUNT), DEFAULT_TIMEOUT)
            .await
    }

    /// Smart path: count clamped to `[1, 500]`, long timeout for large
    /// batches.
    pub async fn generate_smart(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.run(request, clamp_count(request.count, SMART_MAX_COUNT), SMART_TIMEOUT)
            .await
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        count: u32,
        timeout: Duration,
    ) -> Result<GenerationOutcome, GenerationError> {
        let prompt = build_prompt(request, count);
        let started = Instant::now();
        let response = self.backend.complete(&prompt, timeout).await?;
        let records = parse_records(&response)?;

        if let Some(schema) = &request.json_schema {
            validate_records(&records, schema)?;
        }

        let elapsed = started.elapsed();
        info!(
            requested = count,
            generated = records.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "generation completed"
        );
        Ok(GenerationOutcome { records, elapsed })
    }
}
