use crate::extraction::client::MetricExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The extractor carries the injected transport capability; sessions share no
/// other state and nothing survives a request.
#[derive(Clone)]
pub struct AppState {
    pub extractor: MetricExtractor,
}
