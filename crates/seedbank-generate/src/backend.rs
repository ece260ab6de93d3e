//! Completion backends.
//!
//! The production backend talks to an OpenAI-compatible chat-completions
//! endpoint. The trait seam exists so the facade and tests can substitute
//! a scripted backend without touching the pipeline.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::errors::GenerationError;
use crate::prompt::ChatPrompt;

/// Model submitted with every completion request.
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Sampling temperature; fixed for reproducibility of tone, not content.
pub const TEMPERATURE: f64 = 0.5;
/// Client-side timeout for the standard generation path.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Client-side timeout for the smart path, which generates larger batches.
pub const SMART_TIMEOUT: Duration = Duration::from_secs(1000);

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// A text-completion backend.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Submit the prompt and return the model's raw text output.
    async fn complete(
        &self,
        prompt: &ChatPrompt,
        timeout: Duration,
    ) -> Result<String, GenerationError>;
}

/// Chat-completions client for the OpenAI API.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| GenerationError::Failure(err.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Construct from `OPENAI_API_KEY`; absence is the caller's 500.
    pub fn from_env() -> Result<Self, GenerationError> {
        let api_key =
            std::env::var("OPENAI_API_KEY").map_err(|_| GenerationError::MissingApiKey)?;
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }
        Self::new(api_key)
    }

    #[cfg(test)]
    fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(
        &self,
        prompt: &ChatPrompt,
        timeout: Duration,
    ) -> Result<String, GenerationError> {
        let body = json!({
            "model": self.model,
            "temperature": TEMPERATURE,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user},
            ],
        });

        debug!(model = %self.model, timeout_secs = timeout.as_secs(), "submitting completion request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?
            .error_for_status()
            .map_err(map_transport_error)?;

        let payload: Value = response.json().await.map_err(map_transport_error)?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                GenerationError::Failure("completion response carried no message content".into())
            })
    }
}

fn map_transport_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Failure("completion request timed out".into())
    } else {
        GenerationError::Failure(err.to_string())
    }
}
