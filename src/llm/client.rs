//! Summarizer trait - opaque text in, report text out

use async_trait::async_trait;

use crate::error::Result;

/// Stateless summarizer - each call is independent
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Turn a report request into report text
    async fn summarize(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for the audit trail
    fn model(&self) -> &str;
}
