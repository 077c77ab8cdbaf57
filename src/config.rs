use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DigestError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub summarizer: SummarizerConfig,
    pub delivery: DeliveryConfig,
    pub probes: ProbeConfig,
    pub report: ReportConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub api_url: String,
    pub api_version: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub credentials_path: PathBuf,
    pub api_key_field: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com/v1/messages".to_string(),
            api_version: "2023-06-01".to_string(),
            model: "claude-sonnet-4-6".to_string(),
            max_tokens: 1500,
            timeout_ms: 60000,
            credentials_path: home_dir().join(".claude.json"),
            api_key_field: "primaryApiKey".to_string(),
        }
    }
}

impl SummarizerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Read the API key from the JSON credential file.
    ///
    /// A missing file, malformed JSON, or an absent/empty field are all
    /// credential errors; the run must stop before probing.
    pub fn load_api_key(&self) -> std::result::Result<String, DigestError> {
        let path = &self.credentials_path;
        let content = fs::read_to_string(path)
            .map_err(|e| DigestError::Credentials(format!("cannot read {}: {}", path.display(), e)))?;

        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| DigestError::Credentials(format!("invalid JSON in {}: {}", path.display(), e)))?;

        match value.get(&self.api_key_field).and_then(|v| v.as_str()) {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(DigestError::Credentials(format!(
                "{} not found in {}",
                self.api_key_field,
                path.display()
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub api_base: String,
    pub bot_token_env: String,
    pub chat_id_env: String,
    pub parse_mode: String,
    pub chunk_size: usize,
    pub timeout_ms: u64,
    /// Resolved from `bot_token_env` at load time
    #[serde(skip)]
    pub bot_token: String,
    /// Resolved from `chat_id_env` at load time
    #[serde(skip)]
    pub chat_id: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            bot_token_env: "ALERT_BOT_TOKEN".to_string(),
            chat_id_env: "ALERT_CHAT_ID".to_string(),
            parse_mode: "HTML".to_string(),
            chunk_size: 4000,
            timeout_ms: 15000,
            bot_token: String::new(),
            chat_id: String::new(),
        }
    }
}

impl DeliveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Fill in bot token and chat id from the environment.
    ///
    /// Unset variables leave the values empty; delivery then fails per
    /// request instead of aborting the run up front.
    pub fn resolve_env(&mut self) {
        self.bot_token = std::env::var(&self.bot_token_env).unwrap_or_default();
        self.chat_id = std::env::var(&self.chat_id_env).unwrap_or_default();
        if self.bot_token.is_empty() {
            log::warn!("{} is not set, delivery will fail", self.bot_token_env);
        }
        if self.chat_id.is_empty() {
            log::warn!("{} is not set, delivery will fail", self.chat_id_env);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_ms: u64,
    pub concurrent: bool,
    pub service_container: String,
    pub log_lines: u32,
    pub log_window: String,
    pub max_connections: u32,
    pub top_source_ips: u32,
    pub syn_flood_threshold: u32,
    pub ssh_unit: String,
    pub error_lines: u32,
    pub monitor_log: PathBuf,
    pub monitor_lines: u32,
    pub backup_log: PathBuf,
    pub backup_lines: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let logs = home_dir().join(".openclaw").join("logs");
        Self {
            timeout_ms: 10000,
            concurrent: true,
            service_container: "openclaw-gateway".to_string(),
            log_lines: 80,
            log_window: "1h".to_string(),
            max_connections: 20,
            top_source_ips: 10,
            syn_flood_threshold: 50,
            ssh_unit: "ssh.service".to_string(),
            error_lines: 20,
            monitor_log: logs.join("monitor.log"),
            monitor_lines: 15,
            backup_log: logs.join("backup.log"),
            backup_lines: 5,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub server_name: String,
    pub server_description: String,
    pub prose_language: String,
    pub technical_language: String,
    pub max_lines: u32,
    pub template_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            server_name: "openclaw-tg-bot".to_string(),
            server_description: "OpenClaw AI agent + Telegram bot".to_string(),
            prose_language: "Russian".to_string(),
            technical_language: "English".to_string(),
            max_lines: 35,
            template_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: data_dir().join("digest.log"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            summarizer: SummarizerConfig::default(),
            delivery: DeliveryConfig::default(),
            probes: ProbeConfig::default(),
            report: ReportConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Per-user data directory for digestr (`<data_local_dir>/digestr`)
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(env!("CARGO_PKG_NAME"))
}

impl Config {
    /// Load configuration with fallback chain, then resolve environment values
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.delivery.resolve_env();
        Ok(config)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
