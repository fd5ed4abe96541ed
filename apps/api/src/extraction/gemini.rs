//! Google Gemini transport for metric extraction.
//!
//! Model and decoding parameters are hardcoded: extraction must be
//! reproducible, so every call runs the same model with temperature 0,
//! top-k 1, top-p 1 and a JSON response MIME type.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extraction::client::{ExtractionTransport, TransportError};

/// The model used for every extraction call. Hardcoded to prevent drift.
pub const MODEL: &str = "gemini-2.5-flash";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Deterministic decoding parameters.
#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_k: 1,
            top_p: 1.0,
            response_mime_type: "application/json",
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

pub struct GeminiTransport {
    client: Client,
    api_key: String,
}

impl GeminiTransport {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{API_BASE}/{MODEL}:generateContent?key={}", self.api_key)
    }
}

#[async_trait]
impl ExtractionTransport for GeminiTransport {
    async fn generate(&self, prompt: &str) -> Result<String, TransportError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig::default(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| TransportError::Transient {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Transient {
                status: Some(status.as_u16()),
                message: truncate(&body),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                message: truncate(&body),
            });
        }

        let body = response.text().await.map_err(|e| TransportError::Transient {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;

        let text = serde_json::from_str::<GenerateContentResponse>(&body)
            .ok()
            .and_then(|data| data.candidates)
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|p| p.into_iter().next())
            .and_then(|p| p.text);

        match text {
            Some(t) => {
                debug!("gemini call succeeded ({} chars)", t.len());
                Ok(t)
            }
            // A 200 without candidate text is still "the service answered";
            // hand the raw body to the parser, which reports it as malformed.
            None => Ok(body),
        }
    }
}

fn truncate(body: &str) -> String {
    let mut s: String = body.chars().take(200).collect();
    if s.len() < body.len() {
        s.push('…');
    }
    s
}
