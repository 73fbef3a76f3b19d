use serde::{Deserialize, Serialize};

use common::error::AppError;

/// Raw entity shape the LM is prompted to emit, per spec.md §8's S1
/// scenario (`entity_name`, `entity_type`, `entity_description`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawEntity {
    pub entity_name: String,
    pub entity_type: String,
    pub entity_description: String,
}

/// Raw relationship shape the LM is prompted to emit, per spec.md §8's S1
/// scenario.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawRelationship {
    pub source_entity: String,
    pub target_entity: String,
    pub relationship_description: String,
    #[serde(default)]
    pub relationship_keywords: Vec<String>,
    #[serde(default)]
    pub relationship_strength: f64,
}

/// The parsed shape of one LM extraction/glean reply (spec.md §4.2 step 3):
/// `{entities: [...], relationships: [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawExtraction {
    #[serde(default)]
    pub entities: Vec<RawEntity>,
    #[serde(default)]
    pub relationships: Vec<RawRelationship>,
}

/// Strips a leading/trailing triple-backtick code fence (with or without a
/// language tag) from an LM reply, then parses the remainder as a
/// `RawExtraction` JSON object (spec.md §4.2 step 3).
///
/// Per SPEC_FULL.md's Open Question resolution, no further "JSON embedded
/// in prose" recovery is attempted: a reply that isn't, once fences are
/// stripped, a bare JSON object fails to parse and the caller retries.
pub fn parse_extraction_reply(reply: &str) -> Result<RawExtraction, AppError> {
    let stripped = strip_code_fence(reply);
    serde_json::from_str(stripped)
        .map_err(|e| AppError::LmParsing(format!("invalid extraction JSON: {e}")))
}

/// Strips one leading and one trailing triple-backtick fence, tolerating an
/// optional language tag (e.g. ` ```json `) directly after the opening
/// fence.
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let after_open = after_open
        .strip_prefix("json")
        .map_or(after_open, |rest| rest);
    let after_open = after_open.strip_prefix('\n').unwrap_or(after_open);
    after_open.strip_suffix("```").unwrap_or(after_open).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_plain_fence() {
        let input = "```\n{\"entities\":[],\"relationships\":[]}\n```";
        assert_eq!(strip_code_fence(input), "{\"entities\":[],\"relationships\":[]}");
    }

    #[test]
    fn strips_json_tagged_fence() {
        let input = "```json\n{\"entities\":[],\"relationships\":[]}\n```";
        assert_eq!(strip_code_fence(input), "{\"entities\":[],\"relationships\":[]}");
    }

    #[test]
    fn parses_without_fence() {
        let input = "{\"entities\":[],\"relationships\":[]}";
        let parsed = parse_extraction_reply(input).unwrap();
        assert!(parsed.entities.is_empty());
        assert!(parsed.relationships.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_extraction_reply("not json at all").is_err());
    }
}
