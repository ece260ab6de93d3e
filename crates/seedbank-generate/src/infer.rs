//! Schema inference from example records.
//!
//! The service is schema-agnostic at rest; structure is recovered per
//! call from the first few records of a pool. The inferred description is
//! what the prompt builder hands to the model, so it stays deliberately
//! small: a name, field names with a coarse type, and optionality.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::errors::GenerationError;

/// How many example records inference looks at.
pub const EXAMPLE_LIMIT: usize = 3;

/// Coarse type lattice for inferred fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
    Number,
    String,
    Array,
    Object,
    Any,
}

impl FieldType {
    fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(_) => FieldType::Number,
            Value::String(_) => FieldType::String,
            Value::Array(_) => FieldType::Array,
            Value::Object(_) => FieldType::Object,
            Value::Null => FieldType::Any,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }
}

/// One inferred field.
#[derive(Debug, Clone)]
pub struct InferredField {
    pub name: String,
    pub field_type: FieldType,
    /// Set when the key is absent from at least one example.
    pub optional: bool,
}

/// Structural description of an entity, inferred from examples.
#[derive(Debug, Clone)]
pub struct InferredSchema {
    pub name: String,
    pub fields: Vec<InferredField>,
}

impl InferredSchema {
    /// Infer from up to [`EXAMPLE_LIMIT`] records. The key set is the
    /// union across examples; each key takes its type from the first
    /// example that carries it.
    pub fn from_examples(name: &str, examples: &[Value]) -> Result<Self, GenerationError> {
        let examples: Vec<&serde_json::Map<String, Value>> = examples
            .iter()
            .take(EXAMPLE_LIMIT)
            .filter_map(Value::as_object)
            .collect();
        if examples.is_empty() {
            return Err(GenerationError::ExampleDataMissing(name.to_string()));
        }

        let mut fields: BTreeMap<String, FieldType> = BTreeMap::new();
        for example in &examples {
            for (key, value) in example.iter() {
                fields
                    .entry(key.clone())
                    .or_insert_with(|| FieldType::of(value));
            }
        }

        let fields = fields
            .into_iter()
            .map(|(key, field_type)| {
                let optional = !examples.iter().all(|example| example.contains_key(&key));
                InferredField {
                    name: key,
                    field_type,
                    optional,
                }
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            fields,
        })
    }

    /// Render the description embedded in generation prompts: the entity
    /// name followed by one `field: type` line per key, sorted by key.
    pub fn render(&self) -> String {
        let mut out = format!("{}:\n", self.name);
        for field in &self.fields {
            out.push_str("  ");
            out.push_str(&field.name);
            out.push_str(": ");
            out.push_str(field.field_type.as_str());
            if field.optional {
                out.push_str(" (optional)");
            }
            out.push('\n');
        }
        out
    }
}

/// Static per-(project, entity) generation metadata.
#[derive(Debug, Clone, Copy)]
pub struct EntityMetadata {
    pub description: &'static str,
    pub categories: &'static [&'static str],
    pub guidance: &'static str,
}

const MOVIE_GENRES: &[&str] = &[
    "action", "comedy", "drama", "horror", "romance", "scifi", "thriller", "documentary",
];
const BOOK_GENRES: &[&str] = &[
    "fiction", "nonfiction", "mystery", "fantasy", "biography", "history", "poetry",
];
const DEPARTMENTS: &[&str] = &[
    "engineering", "design", "marketing", "sales", "finance", "operations", "support",
];

/// Look up generation guidance for a known demo project. Unknown keys get
/// a generic default that still produces usable prompts.
pub fn entity_metadata(project_key: &str, entity_type: &str) -> EntityMetadata {
    match (project_key, entity_type) {
        ("movies", "movies") => EntityMetadata {
            description: "Feature films with title, director, year, duration, rating and genre.",
            categories: MOVIE_GENRES,
            guidance: "Use plausible release years between 1960 and the present. Ratings are decimals between 1.0 and 9.9.",
        },
        ("books", "books") => EntityMetadata {
            description: "Books with title, author, publication year, page count and genre.",
            categories: BOOK_GENRES,
            guidance: "Mix classic and contemporary titles. Page counts fall between 80 and 1200.",
        },
        ("jobs", "jobs") => EntityMetadata {
            description: "Job postings with title, company, location, salary range and department.",
            categories: DEPARTMENTS,
            guidance: "Salaries are yearly ranges in USD. Locations mix on-site cities and remote.",
        },
        ("personnel", "employees") => EntityMetadata {
            description: "Employee profiles with name, role, department, email and hire date.",
            categories: DEPARTMENTS,
            guidance: "Emails follow firstname.lastname@example.com. Hire dates are ISO dates within the last 15 years.",
        },
        _ => EntityMetadata {
            description: "Records for a demo application dataset.",
            categories: &[],
            guidance: "Keep values realistic and internally consistent across fields.",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn infers_union_of_keys_with_first_seen_types() {
        let examples = vec![
            json!({"id": 1, "title": "Alien", "seen": true}),
            json!({"id": 2, "title": "Heat", "tags": ["crime"]}),
        ];
        let schema = InferredSchema::from_examples("movies", &examples).unwrap();
        let field = |name: &str| schema.fields.iter().find(|f| f.name == name).unwrap();

        assert_eq!(field("id").field_type, FieldType::Number);
        assert_eq!(field("title").field_type, FieldType::String);
        assert_eq!(field("seen").field_type, FieldType::Boolean);
        assert_eq!(field("tags").field_type, FieldType::Array);
        assert!(field("seen").optional);
        assert!(field("tags").optional);
        assert!(!field("id").optional);
    }

    #[test]
    fn null_values_infer_as_any() {
        let examples = vec![json!({"note": null})];
        let schema = InferredSchema::from_examples("x", &examples).unwrap();
        assert_eq!(schema.fields[0].field_type, FieldType::Any);
    }

    #[test]
    fn only_first_three_examples_count() {
        let examples = vec![
            json!({"a": 1}),
            json!({"a": 2}),
            json!({"a": 3}),
            json!({"a": 4, "late": true}),
        ];
        let schema = InferredSchema::from_examples("x", &examples).unwrap();
        assert_eq!(schema.fields.len(), 1);
    }

    #[test]
    fn empty_examples_are_an_error() {
        assert!(matches!(
            InferredSchema::from_examples("movies", &[]),
            Err(GenerationError::ExampleDataMissing(_))
        ));
        assert!(matches!(
            InferredSchema::from_examples("movies", &[json!("not an object")]),
            Err(GenerationError::ExampleDataMissing(_))
        ));
    }

    #[test]
    fn render_sorts_keys_and_marks_optional() {
        let examples = vec![json!({"b": 1, "a": "x"}), json!({"a": "y"})];
        let schema = InferredSchema::from_examples("things", &examples).unwrap();
        assert_eq!(schema.render(), "things:\n  a: string\n  b: number (optional)\n");
    }

    #[test]
    fn metadata_has_generic_default() {
        let known = entity_metadata("movies", "movies");
        assert!(!known.categories.is_empty());
        let unknown = entity_metadata("nope", "nope");
        assert!(unknown.categories.is_empty());
        assert!(!unknown.description.is_empty());
    }
}
