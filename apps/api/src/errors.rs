#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::client::ExtractError;
use crate::pdf::PdfError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Any unrecovered failure halts the pipeline before rendering any result —
/// the client only ever sees a full analysis or this error envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractError),

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Extraction(ExtractError::Failed { .. }) => {
                tracing::error!("extraction retry budget exhausted: {self}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Resume analysis is temporarily unavailable. Try again later.".to_string(),
                )
            }
            AppError::Extraction(ExtractError::Malformed(_)) => {
                tracing::error!("malformed extraction response: {self}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_LLM_RESPONSE",
                    "The analysis service returned an unexpected response.".to_string(),
                )
            }
            AppError::Extraction(ExtractError::Rejected { .. }) => {
                tracing::error!("extraction request rejected: {self}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_REJECTED",
                    "The analysis service rejected the request.".to_string(),
                )
            }
            AppError::Pdf(
                e @ (PdfError::PasswordProtected | PdfError::NoText | PdfError::Unreadable(_)),
            ) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNREADABLE_RESUME",
                e.to_string(),
            ),
            AppError::Pdf(e) => {
                tracing::error!("PDF processing error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PDF_ERROR",
                    "Failed to process the PDF document".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
