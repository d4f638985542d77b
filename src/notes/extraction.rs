use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::TARGET_NOTES;
use crate::llm::generate_llm_response;
use crate::prompts::{note_extraction_prompt, NOTE_EXTRACTION_SYSTEM_PROMPT};
use crate::util::preview;
use crate::LLMParams;

/// Greedy `{ ... }` span, so prose or code fences around the JSON object are ignored.
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{.*\}").expect("static regex is valid")
});

/// Ask the LLM for the perfume notes mentioned in a comment.
///
/// An error means the model could not be reached at all. A reply that cannot be parsed is
/// not an error: it yields an empty list.
pub async fn extract_notes(comment: &str, llm_params: &LLMParams) -> Result<Vec<String>> {
    let user_prompt = note_extraction_prompt(comment);

    let response =
        generate_llm_response(NOTE_EXTRACTION_SYSTEM_PROMPT, &user_prompt, llm_params)
            .await
            .ok_or_else(|| anyhow!("Note extraction failed: no response from {}", llm_params.model))?;

    let notes = parse_notes_response(&response);

    info!(
        target: TARGET_NOTES,
        "Extracted {} notes from comment '{}'",
        notes.len(),
        preview(comment, 50)
    );

    Ok(notes)
}

/// Pull the `notes` list out of a raw model reply.
pub fn parse_notes_response(raw: &str) -> Vec<String> {
    let Some(json_match) = JSON_OBJECT.find(raw) else {
        warn!(target: TARGET_NOTES, "No JSON object in LLM reply: {}", preview(raw, 200));
        return Vec::new();
    };

    let json: Value = match serde_json::from_str(json_match.as_str()) {
        Ok(json) => json,
        Err(e) => {
            warn!(target: TARGET_NOTES, "JSON parsing error: {}. Raw content: {}", e, preview(raw, 200));
            return Vec::new();
        }
    };

    let Some(notes) = json.get("notes").and_then(Value::as_array) else {
        debug!(target: TARGET_NOTES, "LLM reply has no 'notes' array: {}", json);
        return Vec::new();
    };

    notes
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|note| !note.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let notes = parse_notes_response(r#"{"notes": ["bergamot", "lavender", "vanilla"]}"#);
        assert_eq!(notes, vec!["bergamot", "lavender", "vanilla"]);
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let raw = "Sure! Here you go:\n```json\n{\n  \"notes\": [\"rose\", \"oud\"]\n}\n```\nEnjoy.";
        assert_eq!(parse_notes_response(raw), vec!["rose", "oud"]);
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse_notes_response(r#"{"notes": []}"#).is_empty());
    }

    #[test]
    fn test_parse_malformed_replies() {
        assert!(parse_notes_response("no notes here").is_empty());
        assert!(parse_notes_response(r#"{"notes": ["rose",}"#).is_empty());
        assert!(parse_notes_response(r#"{"scents": ["rose"]}"#).is_empty());
        assert!(parse_notes_response(r#"{"notes": "rose"}"#).is_empty());
    }

    #[test]
    fn test_parse_skips_non_strings_and_blanks() {
        let notes = parse_notes_response(r#"{"notes": ["rose", 3, null, "  ", " musk "]}"#);
        assert_eq!(notes, vec!["rose", "musk"]);
    }
}
