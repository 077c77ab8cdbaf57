//! Summarizer Client - Anthropic API integration
//!
//! This module provides:
//! - Message types for the Messages API
//! - Summarizer trait for API abstraction
//! - AnthropicClient implementation

pub mod anthropic;
pub mod client;
pub mod types;

pub use anthropic::AnthropicClient;
pub use client::Summarizer;
pub use types::{CompletionRequest, Message, Role, Usage};
