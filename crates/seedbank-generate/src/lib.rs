//! Synthetic record generation through an LLM completion backend.
//!
//! The flow mirrors how callers use it: infer a structural description
//! from a handful of example records, build a prompt around it, submit to
//! the completion endpoint, then extract and validate the JSON array the
//! model returns. The adapter performs no retries; failures propagate to
//! the facade with enough context to pick a status code.

pub mod backend;
pub mod errors;
pub mod extract;
pub mod generator;
pub mod infer;
pub mod model;
pub mod prompt;
pub mod validate;

pub use backend::{CompletionBackend, DEFAULT_TIMEOUT, OpenAiBackend, SMART_TIMEOUT};
pub use errors::GenerationError;
pub use extract::{extract_json_array, parse_records};
pub use generator::{GenerationOutcome, Generator};
pub use infer::{EntityMetadata, FieldType, InferredField, InferredSchema, entity_metadata};
pub use model::{GenerationRequest, MAX_COUNT, SMART_MAX_COUNT, WriteMode, clamp_count};
pub use prompt::{ChatPrompt, build_prompt};
pub use validate::validate_records;
