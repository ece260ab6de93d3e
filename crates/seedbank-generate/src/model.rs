use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Hard cap for the standard generation path.
pub const MAX_COUNT: u32 = 200;
/// Hard cap for the smart path, which batches larger pools.
pub const SMART_MAX_COUNT: u32 = 500;

/// Clamp a requested record count into `[1, max]`.
pub fn clamp_count(count: u32, max: u32) -> u32 {
    count.clamp(1, max)
}

/// How generated records land on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Merge into the entity's primary file, deduplicating.
    #[default]
    Append,
    /// Start a fresh timestamped file.
    Replace,
}

/// A full generation request as received by the facade.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    /// Structural description of the records to synthesize.
    pub interface_definition: String,
    /// Few-shot example records embedded in the prompt.
    pub examples: Vec<Value>,
    #[serde(default = "default_count")]
    pub count: u32,
    /// Category names to bias generation toward.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub additional_requirements: Option<String>,
    /// Optional JSON Schema every generated record must satisfy.
    #[serde(default)]
    pub json_schema: Option<Value>,
    /// Field naming patterns, e.g. `{"id": "movie-{number}"}`.
    #[serde(default)]
    pub naming_rules: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub project_key: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub save_to_file: bool,
}

fn default_count() -> u32 {
    10
}
