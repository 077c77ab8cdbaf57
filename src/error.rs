//! Error types for digestr
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur while producing a digest
#[derive(Debug, Error)]
pub enum DigestError {
    /// Invalid or unreadable configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Summarizer API key could not be loaded
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// A single probe failed; always recovered with fallback text
    #[error("Probe error: {0}")]
    Probe(String),

    /// Summarizer request or response failure
    #[error("Summarizer error: {0}")]
    Summarizer(String),

    /// Chat delivery failure
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Report template could not be rendered
    #[error("Template error: {0}")]
    Template(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for digestr operations
pub type Result<T> = std::result::Result<T, DigestError>;
