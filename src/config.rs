// src/config.rs

//! Configuration loading utilities.
//!
//! A config file supplies tunables; addresses and credentials are layered
//! on top from the environment at deploy time (see [`Config::apply_env`]).

use std::path::Path;

use crate::models::Config;

#[cfg(feature = "s3")]
use crate::error::{AppError, Result};
#[cfg(feature = "s3")]
use crate::storage::s3::S3StateStore;

/// Load configuration from a local TOML file, then apply environment overrides.
///
/// Falls back to defaults if the file cannot be loaded.
pub fn load_local(path: &Path) -> Config {
    let mut config = Config::load_or_default(path);
    config.apply_env();
    config
}

/// Config loader for Lambda environment.
#[cfg(feature = "s3")]
pub struct LambdaConfigLoader {
    storage: S3StateStore,
    prefix: String,
}

#[cfg(feature = "s3")]
impl LambdaConfigLoader {
    pub fn new(storage: S3StateStore, config_prefix: &str) -> Self {
        Self {
            storage,
            prefix: config_prefix.trim_matches('/').to_string(),
        }
    }

    /// Resolve the config prefix from `CONFIG_S3_PREFIX`, else `{S3_PREFIX}/config`.
    pub fn prefix_from_env() -> String {
        std::env::var("CONFIG_S3_PREFIX").unwrap_or_else(|_| {
            std::env::var("S3_PREFIX")
                .ok()
                .and_then(|prefix| {
                    let trimmed = prefix.trim_matches('/');
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(format!("{}/config", trimmed))
                    }
                })
                .unwrap_or_else(|| "config".to_string())
        })
    }

    /// Load `config.toml` from S3 when present, otherwise defaults; then apply
    /// environment overrides.
    pub async fn load_config(&self) -> Result<Config> {
        let key = format!("{}/config.toml", self.prefix);
        log::info!("Loading config file from S3: {}", key);

        let mut config = match self.storage.read_bytes_optional(&key).await? {
            Some(bytes) => {
                let s = String::from_utf8(bytes).map_err(|e| {
                    AppError::config(format!("Config file {} is not valid UTF-8: {}", key, e))
                })?;
                toml::from_str(&s)?
            }
            None => {
                log::warn!("Config file not found in S3: {}. Using defaults.", key);
                Config::default()
            }
        };

        config.apply_env();
        Ok(config)
    }
}
