// Resume analysis pipeline: upload → text extraction → metric extraction →
// deterministic score. Nothing is persisted between requests.

pub mod handlers;
pub mod scoring;
