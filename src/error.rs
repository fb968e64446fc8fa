//! Crate-wide error type for content loading.

use thiserror::Error;

/// Errors raised while reading category, template, or config content.
///
/// These never escape [`crate::PromptEngine::generate`]; the stores log
/// them and degrade to empty or fallback content.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("unsupported content format: {0}")]
    UnsupportedFormat(String),
    #[error("content error: {0}")]
    Content(String),
}
