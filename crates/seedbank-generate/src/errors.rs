use thiserror::Error;

/// Errors emitted by the generation pipeline.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No usable example records for `(project, entity)`.
    #[error("example data missing: {0}")]
    ExampleDataMissing(String),
    /// Network failure, timeout, or a malformed completion response.
    #[error("generation failed: {0}")]
    Failure(String),
    /// The model's output could not be parsed as a JSON array.
    #[error("generated output is not a JSON array: {0}")]
    Parse(String),
    /// A generated record violated the caller-supplied JSON Schema.
    #[error("record {index} failed schema validation: {message}")]
    SchemaValidation { index: usize, message: String },
    /// The caller-supplied JSON Schema itself does not compile.
    #[error("invalid json schema: {0}")]
    InvalidSchema(String),
    /// The completion backend is not configured.
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
}
