//! Telegram Bot API transport

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::Delivery;
use crate::config::DeliveryConfig;
use crate::error::{DigestError, Result};

/// Reply envelope of the Bot API
#[derive(Debug, Deserialize)]
struct BotReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
}

/// Sends messages through a Telegram bot
pub struct TelegramClient {
    client: Client,
    config: DeliveryConfig,
}

impl TelegramClient {
    pub fn new(config: &DeliveryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DigestError::Delivery(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }

    fn form<'a>(&'a self, chunk: &'a str) -> [(&'static str, &'a str); 3] {
        [
            ("chat_id", self.config.chat_id.as_str()),
            ("text", chunk),
            ("parse_mode", self.config.parse_mode.as_str()),
        ]
    }

    fn check_reply(status: reqwest::StatusCode, body: &str) -> Result<()> {
        let reply: BotReply = serde_json::from_str(body)
            .map_err(|_| DigestError::Delivery(format!("HTTP {}: {}", status, body.trim())))?;
        if reply.ok {
            return Ok(());
        }
        Err(DigestError::Delivery(format!(
            "{} {}",
            reply.error_code.unwrap_or(status.as_u16()),
            reply.description.unwrap_or_else(|| body.trim().to_string())
        )))
    }
}

#[async_trait]
impl Delivery for TelegramClient {
    async fn send_chunk(&self, chunk: &str) -> Result<()> {
        if self.config.bot_token.is_empty() {
            return Err(DigestError::Delivery(format!("{} is not set", self.config.bot_token_env)));
        }
        if self.config.chat_id.is_empty() {
            return Err(DigestError::Delivery(format!("{} is not set", self.config.chat_id_env)));
        }

        let response = self
            .client
            .post(self.endpoint())
            .form(&self.form(chunk))
            .send()
            .await
            // reqwest errors embed the URL, which carries the bot token
            .map_err(|e| DigestError::Delivery(format!("Request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DigestError::Delivery(format!("Failed to read reply: {}", e.without_url())))?;

        Self::check_reply(status, &body)
    }

    fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.config.api_base)
            .field("chat_id", &self.config.chat_id)
            .finish()
    }
}
