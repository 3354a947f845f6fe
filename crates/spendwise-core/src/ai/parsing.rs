//! JSON parsing helpers for classifier responses
//!
//! Models often wrap the JSON payload in prose or code fences, so the
//! outermost `{...}` is extracted before decoding.

use crate::error::{Error, Result};
use crate::models::{Category, ClassificationSuggestion, SuggestionSource};

use super::types::ExternalClassification;

/// Confidence used when the model omits one
pub const DEFAULT_CONFIDENCE: f64 = 0.6;

/// Rationale used when the model omits one
pub const DEFAULT_REASON: &str = "AI suggested category";

fn truncate(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}

/// Parse a classification from raw model text
pub fn parse_classification(response: &str) -> Result<ExternalClassification> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|e| {
                Error::InvalidData(format!(
                    "Invalid JSON from classifier: {} | Raw: {}",
                    e,
                    truncate(json_str)
                ))
            })
        }
        _ => Err(Error::InvalidData(format!(
            "No JSON found in classifier response | Raw: {}",
            truncate(response)
        ))),
    }
}

/// Turn a model answer into a suggestion over the user's own categories
///
/// The name is matched case-insensitively; an unknown or missing name yields `None`.
pub fn resolve_category(
    classification: &ExternalClassification,
    categories: &[Category],
) -> Option<ClassificationSuggestion> {
    let name = classification.category_name.as_deref()?.trim().to_lowercase();
    let category = categories
        .iter()
        .find(|c| c.name.trim().to_lowercase() == name)?;

    let confidence = classification
        .confidence
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);
    let reason = classification
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REASON);

    Some(ClassificationSuggestion::for_category(
        category,
        confidence,
        reason,
        SuggestionSource::External,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<Category> {
        ["Food", "Travel", "Gaming"]
            .iter()
            .enumerate()
            .map(|(i, name)| Category {
                id: i as i64 + 1,
                user_id: 1,
                name: name.to_string(),
                color: None,
                icon: None,
            })
            .collect()
    }

    #[test]
    fn test_parse_plain_json() {
        let parsed =
            parse_classification(r#"{"categoryName": "Food", "confidence": 0.92, "reason": "Restaurant"}"#)
                .unwrap();
        assert_eq!(parsed, ExternalClassification::new("Food", 0.92, "Restaurant"));
    }

    #[test]
    fn test_parse_json_in_code_fence() {
        let text = "Sure! Here you go:\n```json\n{\"categoryName\": \"Travel\"}\n```";
        let parsed = parse_classification(text).unwrap();
        assert_eq!(parsed.category_name.as_deref(), Some("Travel"));
        assert!(parsed.confidence.is_none());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_classification("I think it's food").is_err());
        assert!(parse_classification("{categoryName: Food}").is_err());
        assert!(parse_classification("} backwards {").is_err());
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let suggestion =
            resolve_category(&ExternalClassification::new("gAMING", 0.8, "Steam"), &categories())
                .unwrap();
        assert_eq!(suggestion.category_id, Some(3));
        assert_eq!(suggestion.category_name, "Gaming");
        assert_eq!(suggestion.source, SuggestionSource::External);
    }

    #[test]
    fn test_resolve_unmatched_name() {
        let answer = ExternalClassification::new("Uncategorized", 0.1, "unclear");
        assert!(resolve_category(&answer, &categories()).is_none());
        assert!(resolve_category(&ExternalClassification::default(), &categories()).is_none());
    }

    #[test]
    fn test_resolve_defaults_and_clamp() {
        let answer = ExternalClassification {
            category_name: Some("Food".into()),
            confidence: None,
            reason: None,
        };
        let suggestion = resolve_category(&answer, &categories()).unwrap();
        assert_eq!(suggestion.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(suggestion.reason, DEFAULT_REASON);

        let overconfident = ExternalClassification::new("Food", 7.0, "sure");
        assert_eq!(
            resolve_category(&overconfident, &categories()).unwrap().confidence,
            1.0
        );
    }
}
