// PDF processing: text extraction for the LLM pipeline and highlight
// annotation of flagged passages in the original document.

pub mod highlight;
pub mod text;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("resume PDF is password protected")]
    PasswordProtected,

    #[error("resume PDF could not be read: {0}")]
    Unreadable(String),

    #[error("resume contains no extractable text")]
    NoText,

    #[error("PDF engine error: {0}")]
    Engine(String),

    #[error("failed to rewrite PDF: {0}")]
    Rewrite(#[from] lopdf::Error),
}
