use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which inbound transport feeds the dispatcher.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Mode {
    #[default]
    Webhook,
    Polling,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Webhook => write!(f, "webhook"),
            Mode::Polling => write!(f, "polling"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webhook" => Ok(Mode::Webhook),
            "polling" => Ok(Mode::Polling),
            other => anyhow::bail!("Unknown mode '{}' (expected 'webhook' or 'polling')", other),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_telegram_config")]
    pub telegram: TelegramConfig,
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    #[serde(default = "default_replies_config")]
    pub replies: RepliesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub api_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl TelegramConfig {
    /// Returns the effective api_url: if the stored value is empty,
    /// fall back to the public Bot API endpoint.
    pub fn effective_api_url(&self) -> &str {
        if self.api_url.is_empty() {
            DEFAULT_API_URL
        } else {
            self.api_url.trim_end_matches('/')
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

/// Canned reply texts.
#[derive(Debug, Deserialize, Clone)]
pub struct RepliesConfig {
    #[serde(default = "default_welcome")]
    pub welcome: String,
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

fn default_welcome() -> String {
    "Hello, I'm your bot!".to_string()
}

fn default_fallback() -> String {
    "I only understand /start right now.".to_string()
}

fn default_telegram_config() -> TelegramConfig {
    TelegramConfig {
        bot_token: String::new(),
        api_url: String::new(),
        request_timeout_secs: default_request_timeout_secs(),
    }
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
        webhook_path: default_webhook_path(),
    }
}

fn default_replies_config() -> RepliesConfig {
    RepliesConfig {
        welcome: default_welcome(),
        fallback: default_fallback(),
    }
}

impl Default for RepliesConfig {
    fn default() -> Self {
        default_replies_config()
    }
}

impl Config {
    /// Load configuration, then apply environment overrides and validate.
    ///
    /// With no explicit path, `config.toml` is read if present and skipped
    /// otherwise. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        let path = match path {
            Some(path) => Some(path),
            None => default_path.exists().then_some(default_path.as_path()),
        };

        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                Self::parse(&content)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => Self::parse("")?,
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN").or_else(|| non_empty("BOT_TOKEN")) {
            self.telegram.bot_token = token.trim().to_string();
        }
        if let Some(url) = non_empty("TELEGRAM_API_URL") {
            self.telegram.api_url = url;
        }
        if let Some(host) = non_empty("GREETER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty("GREETER_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("GREETER_PORT is not a valid port: {}", port))?;
        }
        if let Some(mode) = non_empty("GREETER_MODE") {
            self.mode = mode.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!(
                "Telegram bot token is not configured: set TELEGRAM_BOT_TOKEN \
                 or [telegram] bot_token in the config file"
            );
        }
        if !self.server.webhook_path.starts_with('/') {
            anyhow::bail!(
                "[server] webhook_path must start with '/': {}",
                self.server.webhook_path
            );
        }
        if self.server.webhook_path == "/" {
            anyhow::bail!("[server] webhook_path cannot be '/', which serves the health check");
        }
        // The router would read these as captures or wildcards.
        if self.server.webhook_path.contains([':', '*', '{', '}']) {
            anyhow::bail!(
                "[server] webhook_path must be a literal path without ':', '*', '{{' or '}}': {}",
                self.server.webhook_path
            );
        }
        Ok(())
    }
}
