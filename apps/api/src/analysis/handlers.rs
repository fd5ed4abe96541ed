//! Axum route handlers for the resume analysis API.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::analysis::scoring::{ats_score, score_breakdown, ScoreBreakdown};
use crate::errors::AppError;
use crate::extraction::models::{RedMarker, ResumeMetrics, YellowMarker};
use crate::pdf::highlight::annotate_resume;
use crate::pdf::text::extract_normalized_text;
use crate::state::AppState;

/// Download filename for the annotated document.
const ANNOTATED_FILENAME: &str = "Reviewed_Resume.pdf";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub metrics: ResumeMetrics,
}

/// Marker lists handed back by the client for annotation. Field names mirror
/// the `metrics` object of the analyze response.
#[derive(Debug, Default, Deserialize)]
pub struct MarkerSet {
    #[serde(default)]
    pub red_marker_data: Vec<RedMarker>,
    #[serde(default)]
    pub yellow_marker_data: Vec<YellowMarker>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
///
/// Full pipeline for one uploaded resume: extract text, request metrics from
/// the extraction service (with retries), score deterministically. Fails
/// whole — a partial result is never returned.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let upload = read_upload(multipart).await?;

    let resume_text = extract_normalized_text(&upload.pdf)?;
    let metrics = state.extractor.extract(&resume_text).await?;
    let score = ats_score(&metrics);
    let breakdown = score_breakdown(&metrics);

    Ok(Json(AnalyzeResponse {
        score,
        breakdown,
        metrics,
    }))
}

/// POST /api/v1/annotate
///
/// Applies the marker lists from a previous analysis to the original document
/// and returns the annotated PDF as a download. Markers whose text does not
/// appear verbatim are skipped silently.
pub async fn handle_annotate(multipart: Multipart) -> Result<impl IntoResponse, AppError> {
    let upload = read_upload(multipart).await?;
    let raw_markers = upload
        .markers
        .ok_or_else(|| AppError::Validation("missing 'markers' field".to_string()))?;
    let markers: MarkerSet = serde_json::from_str(&raw_markers)
        .map_err(|e| AppError::Validation(format!("markers is not valid JSON: {e}")))?;

    let annotated = annotate_resume(
        &upload.pdf,
        &markers.red_marker_data,
        &markers.yellow_marker_data,
    )?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{ANNOTATED_FILENAME}\""),
            ),
        ],
        annotated,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart upload handling
// ────────────────────────────────────────────────────────────────────────────

struct Upload {
    pdf: Bytes,
    markers: Option<String>,
}

/// Reads the multipart upload: a required `resume` PDF part and an optional
/// `markers` JSON part.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut pdf: Option<(Option<String>, Bytes)> = None;
    let mut markers = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart upload: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume") => {
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
                pdf = Some((file_name, data));
            }
            Some("markers") => {
                markers = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("failed to read markers: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let (file_name, data) =
        pdf.ok_or_else(|| AppError::Validation("missing 'resume' field".to_string()))?;
    validate_upload(file_name.as_deref(), &data)?;

    Ok(Upload { pdf: data, markers })
}

/// Only `.pdf` uploads are accepted; everything else is rejected before any
/// processing happens.
fn validate_upload(file_name: Option<&str>, data: &[u8]) -> Result<(), AppError> {
    if data.is_empty() {
        return Err(AppError::Validation("uploaded resume is empty".to_string()));
    }
    if let Some(name) = file_name {
        if !name.to_ascii_lowercase().ends_with(".pdf") {
            return Err(AppError::Validation(format!(
                "'{name}' is not a PDF — only .pdf resumes are accepted"
            )));
        }
    }
    if !data.starts_with(b"%PDF") {
        return Err(AppError::Validation(
            "uploaded file is not a PDF document".to_string(),
        ));
    }
    Ok(())
}
