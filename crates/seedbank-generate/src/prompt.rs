//! Prompt assembly for the completion backend.

use crate::model::GenerationRequest;

/// System message enforcing the raw-array output contract.
pub const SYSTEM_PROMPT: &str = "You are a synthetic dataset generator. \
Respond with a raw JSON array only: no prose, no markdown fences, no keys \
outside the requested structure.";

/// A system + user message pair ready for the chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

/// Build the single generation prompt: structural description,
/// pretty-printed examples, naming rules, category constraints, and any
/// free-form requirements.
pub fn build_prompt(request: &GenerationRequest, count: u32) -> ChatPrompt {
    let mut user = format!(
        "Generate {count} new records that match this structure:\n\n{}\n",
        request.interface_definition.trim_end()
    );

    let examples =
        serde_json::to_string_pretty(&request.examples).unwrap_or_else(|_| "[]".to_string());
    user.push_str("\nExamples of existing records:\n");
    user.push_str(&examples);
    user.push('\n');

    if let Some(rules) = &request.naming_rules {
        if !rules.is_empty() {
            user.push_str("\nNaming rules for fields:\n");
            for (field, pattern) in rules {
                user.push_str(&format!("- {field}: {pattern}\n"));
            }
        }
    }

    if !request.categories.is_empty() {
        user.push_str(&format!(
            "\nSpread records across these categories: {}.\n",
            request.categories.join(", ")
        ));
    }

    if let Some(requirements) = request
        .additional_requirements
        .as_deref()
        .filter(|text| !text.trim().is_empty())
    {
        user.push_str("\nAdditional requirements:\n");
        user.push_str(requirements.trim());
        user.push('\n');
    }

    user.push_str(&format!(
        "\nReturn only a JSON array of exactly {count} objects. Do not repeat the examples verbatim.\n"
    ));

    ChatPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> GenerationRequest {
        serde_json::from_value(json!({
            "interface_definition": "movies:\n  id: number\n  title: string",
            "examples": [{"id": 1, "title": "Alien"}],
            "categories": ["horror", "drama"],
            "additional_requirements": "Only movies released before 2000.",
            "naming_rules": {"id": "movie-{number}"}
        }))
        .unwrap()
    }

    #[test]
    fn prompt_embeds_all_sections() {
        let prompt = build_prompt(&request(), 5);
        assert!(prompt.user.contains("Generate 5 new records"));
        assert!(prompt.user.contains("movies:\n  id: number"));
        assert!(prompt.user.contains("\"title\": \"Alien\""));
        assert!(prompt.user.contains("movie-{number}"));
        assert!(prompt.user.contains("horror, drama"));
        assert!(prompt.user.contains("released before 2000"));
        assert!(prompt.user.contains("JSON array of exactly 5"));
        assert!(prompt.system.contains("JSON array"));
    }
}
