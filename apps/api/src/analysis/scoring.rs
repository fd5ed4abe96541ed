//! Deterministic compatibility scoring — pure arithmetic over extracted
//! metrics. No LLM involvement: identical metrics always produce the
//! identical score.

use serde::Serialize;

use crate::extraction::models::ResumeMetrics;

/// Per-term decomposition of the final score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// 4 points per matched keyword, capped at 40.
    pub keyword_points: u32,
    /// 25 / 18 / 10 / 0 tier at ≥5 / ≥3 / ≥1 years (inclusive boundaries).
    pub experience_points: u32,
    /// 2 points per strong action verb, capped at 20.
    pub action_verb_points: u32,
    /// max(10 − 2 × formatting issues, 0).
    pub formatting_points: u32,
    /// max(5 − weak phrases, 0).
    pub brevity_points: u32,
    /// Sum of the five terms, clamped to 100.
    pub total: u32,
}

/// Computes the 0–100 compatibility score.
///
/// Precondition: `metrics` passed schema validation — counts are unsigned and
/// `experience_years` is finite and non-negative.
pub fn ats_score(metrics: &ResumeMetrics) -> u32 {
    score_breakdown(metrics).total
}

pub fn score_breakdown(metrics: &ResumeMetrics) -> ScoreBreakdown {
    // Only the first 10 matches can contribute under the 40-point cap.
    let keyword_points = 4 * metrics.keyword_matches.len().min(10) as u32;

    let years = metrics.experience_years;
    let experience_points = if years >= 5.0 {
        25
    } else if years >= 3.0 {
        18
    } else if years >= 1.0 {
        10
    } else {
        0
    };

    let action_verb_points = metrics.strong_action_verbs.saturating_mul(2).min(20);
    let formatting_points =
        10u32.saturating_sub(metrics.formatting_issues_count.saturating_mul(2));
    let brevity_points = 5u32.saturating_sub(metrics.weak_phrases_count);

    let total = (keyword_points
        + experience_points
        + action_verb_points
        + formatting_points
        + brevity_points)
        .min(100);

    ScoreBreakdown {
        keyword_points,
        experience_points,
        action_verb_points,
        formatting_points,
        brevity_points,
        total,
    }
}
