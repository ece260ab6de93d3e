use jsonschema::JSONSchema;
use serde_json::Value;

use crate::errors::GenerationError;

/// Validate every generated record against a caller-supplied JSON Schema.
/// The first failing record aborts with its index and the leading
/// violation message.
pub fn validate_records(records: &[Value], schema: &Value) -> Result<(), GenerationError> {
    let compiled =
        JSONSchema::compile(schema).map_err(|err| GenerationError::InvalidSchema(err.to_string()))?;

    for (index, record) in records.iter().enumerate() {
        if let Err(mut errors) = compiled.validate(record) {
            let message = errors
                .next()
                .map(|error| error.to_string())
                .unwrap_or_else(|| "schema violation".to_string());
            return Err(GenerationError::SchemaValidation { index, message });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "required": ["id", "title"],
            "properties": {
                "id": {"type": "integer"},
                "title": {"type": "string"}
            }
        })
    }

    #[test]
    fn conforming_records_pass() {
        let records = vec![json!({"id": 1, "title": "Alien"})];
        assert!(validate_records(&records, &schema()).is_ok());
    }

    #[test]
    fn first_failure_reports_record_index() {
        let records = vec![
            json!({"id": 1, "title": "Alien"}),
            json!({"id": "two", "title": "Heat"}),
        ];
        match validate_records(&records, &schema()) {
            Err(GenerationError::SchemaValidation { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected schema validation failure, got {other:?}"),
        }
    }

    #[test]
    fn bad_schema_is_its_own_error() {
        let records = vec![json!({})];
        let bad = json!({"type": "not-a-type"});
        assert!(matches!(
            validate_records(&records, &bad),
            Err(GenerationError::InvalidSchema(_))
        ));
    }
}
