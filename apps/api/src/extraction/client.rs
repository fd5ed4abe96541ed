//! Metric extraction client — wraps the LLM transport with bounded retries
//! and a strict parse-and-validate step.
//!
//! The transport is an explicitly constructed, injected capability object
//! (`Arc<dyn ExtractionTransport>`), never ambient global state: production
//! wires in `GeminiTransport`, tests wire in scripted doubles.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::extraction::models::{parse_metrics, ResumeMetrics};
use crate::extraction::prompts::METRIC_EXTRACTION_PROMPT_TEMPLATE;

/// Total attempt budget, including the first call.
pub const MAX_ATTEMPTS: u32 = 5;

/// Wire-level failure, classified by the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Rate limiting, server overload, or a network failure. Retryable.
    #[error("transient service error (status {status:?}): {message}")]
    Transient {
        status: Option<u16>,
        message: String,
    },

    /// The service rejected the request outright (bad request, auth failure).
    /// Retrying cannot help.
    #[error("request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Failure surface of [`MetricExtractor::extract`].
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Every attempt hit a transient failure; the retry budget is spent.
    #[error("metric extraction failed after {attempts} attempts: {last_error}")]
    Failed { attempts: u32, last_error: String },

    /// The service answered, but the payload does not match the metrics
    /// schema. Not an overload condition, so never retried.
    #[error("metric extraction response did not match the expected schema: {0}")]
    Malformed(String),

    /// Permanent rejection, propagated on the first occurrence.
    #[error("metric extraction request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// One extraction request to the LLM service. Implementations classify
/// failures into [`TransportError`] and return the raw response text on
/// success; parsing is the client's job.
#[async_trait]
pub trait ExtractionTransport: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, TransportError>;
}

/// The single extraction client used by all handlers.
#[derive(Clone)]
pub struct MetricExtractor {
    transport: Arc<dyn ExtractionTransport>,
}

impl MetricExtractor {
    pub fn new(transport: Arc<dyn ExtractionTransport>) -> Self {
        Self { transport }
    }

    /// Sends the fixed extraction instruction for `resume_text` and parses the
    /// response into validated [`ResumeMetrics`].
    ///
    /// Transient failures are retried up to [`MAX_ATTEMPTS`] total attempts;
    /// the wait after failed attempt k (0-indexed) is `min(2^k × 5s, 60s)`.
    /// Parse failures and permanent rejections return immediately.
    pub async fn extract(&self, resume_text: &str) -> Result<ResumeMetrics, ExtractError> {
        let prompt = METRIC_EXTRACTION_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);

        let mut last_error = String::new();

        for attempt in 0..MAX_ATTEMPTS {
            match self.transport.generate(&prompt).await {
                Ok(raw) => {
                    let metrics = parse_metrics(&raw).map_err(ExtractError::Malformed)?;
                    debug!(attempt, "metric extraction succeeded");
                    return Ok(metrics);
                }
                Err(TransportError::Rejected { status, message }) => {
                    return Err(ExtractError::Rejected { status, message });
                }
                Err(e @ TransportError::Transient { .. }) => {
                    last_error = e.to_string();
                    if attempt + 1 < MAX_ATTEMPTS {
                        let delay = backoff_delay(attempt);
                        warn!(
                            attempt = attempt + 1,
                            "transient extraction failure, retrying in {}s: {last_error}",
                            delay.as_secs()
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(ExtractError::Failed {
            attempts: MAX_ATTEMPTS,
            last_error,
        })
    }
}

/// Backoff after failed attempt `attempt` (0-indexed): min(2^attempt × 5s, 60s).
fn backoff_delay(attempt: u32) -> Duration {
    // 2^4 × 5 = 80 already exceeds the 60s ceiling, so the shift can cap at 4.
    let secs = 5u64 << attempt.min(4);
    Duration::from_secs(secs.min(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    const VALID_METRICS: &str = r#"{
        "keyword_matches": ["Rust", "Tokio"],
        "missing_keywords": ["Kubernetes"],
        "experience_years": 4,
        "strong_action_verbs": 6,
        "weak_phrases_count": 2,
        "formatting_issues_count": 1
    }"#;

    fn transient() -> TransportError {
        TransportError::Transient {
            status: Some(429),
            message: "rate limited".to_string(),
        }
    }

    /// Transport double that replays a fixed script of outcomes. A call past
    /// the end of the script panics, which doubles as the attempt-bound check.
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<String, TransportError>>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<String, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExtractionTransport for ScriptedTransport {
        async fn generate(&self, _prompt: &str) -> Result<String, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport called more times than scripted")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_transient_makes_exactly_five_attempts() {
        let transport = ScriptedTransport::new((0..5).map(|_| Err(transient())).collect());
        let extractor = MetricExtractor::new(transport.clone());

        let start = Instant::now();
        let err = extractor.extract("resume text").await.unwrap_err();

        assert!(matches!(err, ExtractError::Failed { attempts: 5, .. }));
        assert_eq!(transport.calls(), 5);
        // Waits between the five attempts: 5 + 10 + 20 + 40 seconds.
        assert_eq!(start.elapsed(), Duration::from_secs(75));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_then_success_returns_after_two_attempts() {
        let transport =
            ScriptedTransport::new(vec![Err(transient()), Ok(VALID_METRICS.to_string())]);
        let extractor = MetricExtractor::new(transport.clone());

        let start = Instant::now();
        let metrics = extractor.extract("resume text").await.unwrap();

        assert_eq!(metrics.keyword_matches.len(), 2);
        assert_eq!(transport.calls(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt_never_sleeps() {
        let transport = ScriptedTransport::new(vec![Ok(VALID_METRICS.to_string())]);
        let extractor = MetricExtractor::new(transport.clone());

        let start = Instant::now();
        let metrics = extractor.extract("resume text").await.unwrap();

        assert_eq!(metrics.strong_action_verbs, 6);
        assert_eq!(transport.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_response_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Ok("not json at all".to_string())]);
        let extractor = MetricExtractor::new(transport.clone());

        let start = Instant::now();
        let err = extractor.extract("resume text").await.unwrap_err();

        assert!(matches!(err, ExtractError::Malformed(_)));
        assert_eq!(transport.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schema_violation_is_not_retried() {
        // Parses as JSON but violates the schema (negative count).
        let payload = r#"{
            "keyword_matches": [],
            "experience_years": 2,
            "strong_action_verbs": -1,
            "weak_phrases_count": 0,
            "formatting_issues_count": 0
        }"#;
        let transport = ScriptedTransport::new(vec![Ok(payload.to_string())]);
        let extractor = MetricExtractor::new(transport.clone());

        let err = extractor.extract("resume text").await.unwrap_err();

        assert!(matches!(err, ExtractError::Malformed(_)));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_rejection_propagates_immediately() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Rejected {
            status: 400,
            message: "invalid request".to_string(),
        })]);
        let extractor = MetricExtractor::new(transport.clone());

        let err = extractor.extract("resume text").await.unwrap_err();

        assert!(matches!(err, ExtractError::Rejected { status: 400, .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn test_backoff_follows_capped_exponential() {
        assert_eq!(backoff_delay(0), Duration::from_secs(5));
        assert_eq!(backoff_delay(1), Duration::from_secs(10));
        assert_eq!(backoff_delay(2), Duration::from_secs(20));
        assert_eq!(backoff_delay(3), Duration::from_secs(40));
        assert_eq!(backoff_delay(4), Duration::from_secs(60));
        assert_eq!(backoff_delay(10), Duration::from_secs(60));
    }
}
