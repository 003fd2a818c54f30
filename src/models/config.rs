//! Application configuration structures.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Classification and message sizing
    #[serde(default)]
    pub run: RunConfig,

    /// Contract source connection settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Discord channel settings
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Persisted state locations
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override settings from deploy-time environment variables.
    ///
    /// Addresses and credentials are expected to arrive this way rather than
    /// through the config file.
    pub fn apply_env(&mut self) {
        if let Ok(url) = env::var("CONTRACTS_URL") {
            self.source.url = url;
        }
        if let Ok(token) = env::var("CONTRACTS_REFRESH_TOKEN") {
            self.source.refresh_token = Some(token);
        }
        if let Ok(token) = env::var("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        if let Ok(channel) = env::var("DISCORD_CHANNEL_ID") {
            self.discord.channel_id = channel;
        }
        if let Ok(base) = env::var("DISCORD_API_BASE") {
            self.discord.api_base = base;
        }
        if let Some(hours) = parse_env("EXPIRY_HORIZON_HOURS") {
            self.run.expiry_horizon_hours = hours;
        }
        if let Ok(path) = env::var("STATE_FILE") {
            self.storage.state_file = path;
        }
        if let Ok(key) = env::var("STATE_S3_KEY") {
            self.storage.s3_key = key;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.run.expiry_horizon_hours == 0 {
            return Err(AppError::validation("run.expiry_horizon_hours must be > 0"));
        }
        if self.run.char_limit == 0 {
            return Err(AppError::validation("run.char_limit must be > 0"));
        }
        if self.source.url.trim().is_empty() {
            return Err(AppError::validation("source.url is empty"));
        }
        Url::parse(&self.source.url)
            .map_err(|e| AppError::validation(format!("source.url is invalid: {e}")))?;
        if self.source.max_retries == 0 {
            return Err(AppError::validation("source.max_retries must be > 0"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.discord.token.trim().is_empty() {
            return Err(AppError::validation("discord.token is empty"));
        }
        if self.discord.channel_id.trim().is_empty() {
            return Err(AppError::validation("discord.channel_id is empty"));
        }
        Url::parse(&self.discord.api_base)
            .map_err(|e| AppError::validation(format!("discord.api_base is invalid: {e}")))?;
        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

/// Classification and message sizing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Contracts expiring within this many hours are flagged
    #[serde(default = "defaults::expiry_horizon_hours")]
    pub expiry_horizon_hours: u32,

    /// Maximum size of a single message block
    #[serde(default = "defaults::char_limit")]
    pub char_limit: usize,
}

impl RunConfig {
    pub fn expiry_horizon(&self) -> Duration {
        Duration::hours(i64::from(self.expiry_horizon_hours))
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            expiry_horizon_hours: defaults::expiry_horizon_hours(),
            char_limit: defaults::char_limit(),
        }
    }
}

/// Contract source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Endpoint serving buyback contracts
    #[serde(default)]
    pub url: String,

    /// Refresh token sent with each request
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Attempts before a fetch error is surfaced
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Delay between attempts in seconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Response language requested from the source
    #[serde(default = "defaults::language")]
    pub language: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            refresh_token: None,
            max_retries: defaults::max_retries(),
            retry_delay_secs: defaults::retry_delay(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
            language: defaults::language(),
        }
    }
}

/// Discord channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// REST API base URL
    #[serde(default = "defaults::discord_api_base")]
    pub api_base: String,

    /// Channel receiving the notifications
    #[serde(default)]
    pub channel_id: String,

    /// Bot token
    #[serde(default)]
    pub token: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::discord_api_base(),
            channel_id: String::new(),
            token: String::new(),
        }
    }
}

/// Persisted state locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local state document path
    #[serde(default = "defaults::state_file")]
    pub state_file: String,

    /// S3 key of the state document, relative to the prefix
    #[serde(default = "defaults::s3_key")]
    pub s3_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: defaults::state_file(),
            s3_key: defaults::s3_key(),
        }
    }
}

mod defaults {
    // Run defaults
    pub fn expiry_horizon_hours() -> u32 {
        48
    }
    pub fn char_limit() -> usize {
        2000
    }

    // Source defaults
    pub fn max_retries() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        10
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        concat!("notifier/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn language() -> String {
        "en".into()
    }

    // Discord defaults
    pub fn discord_api_base() -> String {
        "https://discord.com/api/v10".into()
    }

    // Storage defaults
    pub fn state_file() -> String {
        "storage/last_run.json".into()
    }
    pub fn s3_key() -> String {
        "contract_notifications/buyback_last_run.json".into()
    }
}
