//! Delivery Client - chunked chat delivery
//!
//! Long text is split into transport-sized chunks sent in order. A rejected
//! chunk is logged and the remaining chunks are still attempted.

mod chunk;
mod telegram;

use async_trait::async_trait;

use crate::error::Result;

pub use chunk::split_chunks;
pub use telegram::TelegramClient;

/// Outcome of sending one piece of text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Number of chunks the text was split into
    pub chunks: usize,
    /// Chunks accepted by the transport
    pub sent: usize,
    /// One reason per rejected chunk, in send order
    pub rejected: Vec<String>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }

    /// True when text was split into chunks and none got through
    pub fn nothing_delivered(&self) -> bool {
        self.chunks > 0 && self.sent == 0
    }
}

/// Chat transport with a per-message size limit
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Send one chunk that already fits the transport limit
    async fn send_chunk(&self, chunk: &str) -> Result<()>;

    /// Maximum characters per message
    fn chunk_size(&self) -> usize;

    /// Split `text` and send every chunk in order
    async fn send_text(&self, text: &str) -> DeliveryReport {
        let chunks = split_chunks(text, self.chunk_size());
        let mut report = DeliveryReport {
            chunks: chunks.len(),
            ..Default::default()
        };

        for (index, chunk) in chunks.iter().enumerate() {
            match self.send_chunk(chunk).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    log::warn!("Chunk {}/{} rejected: {}", index + 1, report.chunks, e);
                    report.rejected.push(e.to_string());
                }
            }
        }
        report
    }

    /// Best-effort notice; never fails, reports whether anything got through
    async fn notify(&self, text: &str) -> bool {
        let report = self.send_text(text).await;
        if report.nothing_delivered() {
            log::error!("Failed to deliver notice: {}", report.rejected.join("; "));
            return false;
        }
        true
    }
}

/// Escape text for the HTML parse mode
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
