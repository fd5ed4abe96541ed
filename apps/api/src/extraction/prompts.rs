// Metric extraction instruction. Demands objective extraction only — scoring
// is reserved for the deterministic scorer so identical resume text always
// yields an identical score.

/// Extraction prompt template. Replace `{resume_text}` before sending.
pub const METRIC_EXTRACTION_PROMPT_TEMPLATE: &str = r#"Act strictly as a Resume Parsing Engine.

Resume Text:
{resume_text}

Extract ATS-relevant metrics objectively.
Do NOT calculate any score.
Do NOT estimate quality or tone.

Return ONLY valid JSON:
{
  "keyword_matches": ["Python", "SQL"],
  "missing_keywords": ["Docker", "AWS"],
  "experience_years": number,
  "strong_action_verbs": number,
  "weak_phrases_count": number,
  "formatting_issues_count": number,
  "red_marker_data": [
    {"original_text": "EXACT_STRING", "reason": "why", "correction": "FIXED_STRING"}
  ],
  "yellow_marker_data": [
    {"original_text": "EXACT_STRING", "reason": "why", "suggestion": "BETTER_STRING", "add_keywords": ["kw1"]}
  ]
}

The "original_text" values MUST be copied verbatim from the resume text — they
are matched literally against the document for highlighting."#;
