//! Anthropic API client implementation
//!
//! This module implements the Summarizer trait for the Anthropic (Claude)
//! Messages API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::SummarizerConfig;
use crate::error::{DigestError, Result};
use crate::llm::client::Summarizer;
use crate::llm::types::{CompletionRequest, Usage};

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    config: SummarizerConfig,
}

impl AnthropicClient {
    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: &SummarizerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DigestError::Summarizer(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config: config.clone(),
        })
    }

    /// Build the request body for the Messages API
    fn build_request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest::single(&self.config.model, self.config.max_tokens, prompt)
    }

    /// Extract the report: the text of the first content block
    fn parse_response(&self, body: Value) -> Result<String> {
        if let Some(usage) = body.get("usage") {
            let usage: Usage = serde_json::from_value(usage.clone()).unwrap_or_default();
            log::debug!(
                "Summarizer usage: {} input, {} output tokens",
                usage.input_tokens,
                usage.output_tokens
            );
        }

        body["content"]
            .get(0)
            .and_then(|block| block["text"].as_str())
            .map(|text| text.to_string())
            .ok_or_else(|| DigestError::Summarizer("Response has no text in its first content block".to_string()))
    }

    /// Send a request to the Anthropic API
    async fn send_request(&self, body: &CompletionRequest) -> Result<Value> {
        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.api_version)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DigestError::Summarizer(format!("Request timed out after {}ms", self.config.timeout_ms))
                } else {
                    DigestError::Summarizer(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DigestError::Summarizer(format!(
                "Rate limited, retry after {} seconds",
                retry_after
            )));
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DigestError::Summarizer(format!("API error {}: {}", status, error_body)));
        }

        response
            .json()
            .await
            .map_err(|e| DigestError::Summarizer(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Summarizer for AnthropicClient {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        let body = self.build_request(prompt);
        let response = self.send_request(&body).await?;
        self.parse_response(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}
