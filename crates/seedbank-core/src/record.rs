//! Helpers over schema-agnostic records.
//!
//! A record is a `serde_json::Value` object; the service never assumes a
//! fixed schema at rest, only a handful of conventional keys (`id`,
//! `title`, `category`) used for deduplication and bucketing.

use serde_json::Value;

/// Render a JSON scalar as a plain string. Arrays, objects, and null have
/// no scalar form.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// The record's `id` field as a string, when it carries one.
pub fn record_id(record: &Value) -> Option<String> {
    record.get("id").and_then(scalar_string)
}

/// Deduplication key for a record at `index` within its batch.
///
/// Precedence: `id` if present, then the `(title, category)` composite,
/// then the insertion index. First occurrence wins at the call site.
pub fn dedup_key(record: &Value, index: usize) -> String {
    if let Some(id) = record_id(record) {
        return format!("id:{id}");
    }
    let title = record.get("title").and_then(scalar_string);
    let category = record.get("category").and_then(scalar_string);
    if title.is_some() || category.is_some() {
        return format!(
            "tc:{}|{}",
            title.unwrap_or_default(),
            category.unwrap_or_default()
        );
    }
    format!("idx:{index}")
}

/// Bucketing value for stratified selection.
///
/// Array-valued fields contribute their first element, so a record tagged
/// with several categories counts only toward the first-listed one.
/// Missing or non-scalar values fall back to `"unknown"`.
pub fn category_of(record: &Value, key: &str) -> String {
    let fallback = || "unknown".to_string();
    match record.get(key) {
        Some(Value::Array(items)) => items.first().and_then(scalar_string).unwrap_or_else(fallback),
        Some(value) => scalar_string(value).unwrap_or_else(fallback),
        None => fallback(),
    }
}
