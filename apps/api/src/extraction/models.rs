//! Typed metric payload — the boundary between raw LLM output and the rest of
//! the pipeline. Parsing either yields a fully-populated `ResumeMetrics` or a
//! failure; nothing downstream ever touches raw JSON.

use serde::{Deserialize, Serialize};

/// A passage flagged as a defect: the literal text, why it is wrong, and a
/// suggested replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedMarker {
    pub original_text: String,
    pub reason: String,
    pub correction: String,
}

/// A passage that is not wrong but could be improved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YellowMarker {
    pub original_text: String,
    pub reason: String,
    pub suggestion: String,
    #[serde(default)]
    pub add_keywords: Vec<String>,
}

/// Objective metrics extracted from one resume. Constructed once per upload,
/// immutable afterwards, never persisted.
///
/// Counts are unsigned by construction: a negative count in the payload fails
/// deserialization and surfaces as a malformed response rather than flowing
/// into the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeMetrics {
    pub keyword_matches: Vec<String>,
    /// Relevant keywords absent from the resume. Informational only — the
    /// scorer does not read this field.
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    pub experience_years: f64,
    pub strong_action_verbs: u32,
    pub weak_phrases_count: u32,
    pub formatting_issues_count: u32,
    #[serde(default)]
    pub red_marker_data: Vec<RedMarker>,
    #[serde(default)]
    pub yellow_marker_data: Vec<YellowMarker>,
}

impl ResumeMetrics {
    fn validate(&self) -> Result<(), String> {
        if !self.experience_years.is_finite() {
            return Err(format!(
                "experience_years is not a finite number: {}",
                self.experience_years
            ));
        }
        if self.experience_years < 0.0 {
            return Err(format!(
                "experience_years is negative: {}",
                self.experience_years
            ));
        }
        Ok(())
    }
}

/// Parses raw LLM output into a validated `ResumeMetrics`.
pub fn parse_metrics(raw: &str) -> Result<ResumeMetrics, String> {
    let text = strip_json_fences(raw);
    let metrics: ResumeMetrics = serde_json::from_str(text).map_err(|e| e.to_string())?;
    metrics.validate()?;
    Ok(metrics)
}

/// Strips ```json ... ``` or ``` ... ``` code fences if the model wraps its
/// JSON in them despite the structured response mode.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    for prefix in ["```json", "```"] {
        if let Some(stripped) = text.strip_prefix(prefix) {
            let stripped = stripped.trim_start();
            return stripped
                .strip_suffix("```")
                .map(str::trim_end)
                .unwrap_or(stripped);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_PAYLOAD: &str = r#"{
        "keyword_matches": ["Python", "SQL"],
        "missing_keywords": ["Docker", "AWS"],
        "experience_years": 4.5,
        "strong_action_verbs": 6,
        "weak_phrases_count": 2,
        "formatting_issues_count": 1,
        "red_marker_data": [
            {"original_text": "responsible for stuff", "reason": "vague", "correction": "owned X"}
        ],
        "yellow_marker_data": [
            {"original_text": "worked on backend", "reason": "weak verb", "suggestion": "built backend services", "add_keywords": ["Rust"]}
        ]
    }"#;

    #[test]
    fn test_full_payload_deserializes() {
        let metrics = parse_metrics(FULL_PAYLOAD).unwrap();
        assert_eq!(metrics.keyword_matches, vec!["Python", "SQL"]);
        assert_eq!(metrics.missing_keywords.len(), 2);
        assert!((metrics.experience_years - 4.5).abs() < f64::EPSILON);
        assert_eq!(metrics.strong_action_verbs, 6);
        assert_eq!(metrics.red_marker_data[0].correction, "owned X");
        assert_eq!(metrics.yellow_marker_data[0].add_keywords, vec!["Rust"]);
    }

    #[test]
    fn test_marker_lists_default_to_empty() {
        let metrics = parse_metrics(
            r#"{
                "keyword_matches": [],
                "experience_years": 0,
                "strong_action_verbs": 0,
                "weak_phrases_count": 0,
                "formatting_issues_count": 0
            }"#,
        )
        .unwrap();
        assert!(metrics.missing_keywords.is_empty());
        assert!(metrics.red_marker_data.is_empty());
        assert!(metrics.yellow_marker_data.is_empty());
    }

    #[test]
    fn test_fenced_payload_parses() {
        let fenced = format!("```json\n{FULL_PAYLOAD}\n```");
        let metrics = parse_metrics(&fenced).unwrap();
        assert_eq!(metrics.keyword_matches.len(), 2);
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let err = parse_metrics(
            r#"{
                "keyword_matches": [],
                "experience_years": 2,
                "strong_action_verbs": -3,
                "weak_phrases_count": 0,
                "formatting_issues_count": 0
            }"#,
        )
        .unwrap_err();
        assert!(err.contains("u32"), "unexpected error: {err}");
    }

    #[test]
    fn test_negative_experience_is_rejected() {
        let err = parse_metrics(
            r#"{
                "keyword_matches": [],
                "experience_years": -1,
                "strong_action_verbs": 0,
                "weak_phrases_count": 0,
                "formatting_issues_count": 0
            }"#,
        )
        .unwrap_err();
        assert!(err.contains("negative"), "unexpected error: {err}");
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        assert!(parse_metrics(r#"{"keyword_matches": []}"#).is_err());
    }

    #[test]
    fn test_non_json_is_rejected() {
        assert!(parse_metrics("I could not process this resume.").is_err());
    }

    #[test]
    fn test_strip_json_fences_variants() {
        assert_eq!(strip_json_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_json_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_json_fences("{}"), "{}");
    }
}
