//! Resume text extraction — produces the single normalized string the metric
//! extraction prompt operates on.

use super::PdfError;

/// A resume with fewer non-whitespace characters than this is treated as a
/// scanned image rather than a text document.
const MIN_TEXT_CHARS: usize = 50;

/// Extracts all page text from `pdf_bytes` and collapses every whitespace run
/// (including page breaks) to a single space.
pub fn extract_normalized_text(pdf_bytes: &[u8]) -> Result<String, PdfError> {
    let raw = pdf_extract::extract_text_from_mem(pdf_bytes).map_err(|e| {
        let message = e.to_string();
        let lower = message.to_lowercase();
        if lower.contains("encrypted") || lower.contains("password") {
            PdfError::PasswordProtected
        } else {
            PdfError::Unreadable(message)
        }
    })?;

    normalize_extracted(&raw)
}

fn normalize_extracted(raw: &str) -> Result<String, PdfError> {
    let text = collapse_whitespace(raw);
    if text.chars().filter(|c| !c.is_whitespace()).count() < MIN_TEXT_CHARS {
        return Err(PdfError::NoText);
    }
    Ok(text)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
