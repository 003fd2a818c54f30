// src/services/contracts.rs

//! Contract source services.
//!
//! Both sources read the same buyback contracts document:
//!
//! ```text
//! { "contracts": [ { "hash_code": "…", "esi_contract": { "issued": 1709294400, "expires": 1709553600 } } ] }
//! ```
//!
//! Times are unix seconds. A record without an `esi_contract` or without
//! either time fails the whole fetch.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Contract, SourceConfig};
use crate::services::ContractSource;
use crate::utils::http::{create_async_client, describe_failure};

/// Request body for the buyback contracts endpoint.
#[derive(Debug, Clone, Serialize)]
struct ContractsRequest<'a> {
    include_items: bool,
    include_check: bool,
    include_buy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    language: &'a str,
}

/// Buyback contracts document.
#[derive(Debug, Clone, Deserialize)]
struct ContractsResponse {
    #[serde(default)]
    contracts: Vec<RawContract>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawContract {
    hash_code: String,
    #[serde(default)]
    esi_contract: Option<EsiContract>,
}

#[derive(Debug, Clone, Deserialize)]
struct EsiContract {
    #[serde(default)]
    issued: Option<i64>,
    #[serde(default)]
    expires: Option<i64>,
}

fn unix_time(hash_code: &str, field: &str, secs: Option<i64>) -> Result<DateTime<Utc>> {
    let secs = secs.ok_or_else(|| AppError::malformed(hash_code, format!("missing {field}")))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::malformed(hash_code, format!("{field} {secs} is out of range")))
}

/// Convert a decoded document into contracts, rejecting incomplete records.
fn decode_contracts(response: ContractsResponse) -> Result<Vec<Contract>> {
    let mut contracts = Vec::with_capacity(response.contracts.len());
    for raw in response.contracts {
        let esi = raw
            .esi_contract
            .ok_or_else(|| AppError::malformed(raw.hash_code.as_str(), "contract has no ESI contract"))?;
        let issued = unix_time(&raw.hash_code, "issued", esi.issued)?;
        let expires = unix_time(&raw.hash_code, "expires", esi.expires)?;
        contracts.push(Contract::new(raw.hash_code, issued, expires));
    }
    Ok(contracts)
}

/// Parse a contracts document from JSON bytes.
pub(crate) fn parse_contracts(bytes: &[u8]) -> Result<Vec<Contract>> {
    let response: ContractsResponse = serde_json::from_slice(bytes)?;
    decode_contracts(response)
}

/// Fetches contracts from the buyback contracts HTTP endpoint.
pub struct HttpContractSource {
    client: Client,
    config: SourceConfig,
}

impl HttpContractSource {
    /// Create a new source with the given configuration.
    pub fn new(config: SourceConfig) -> Result<Self> {
        let client = create_async_client(&config.user_agent, config.timeout_secs)?;
        Ok(Self { client, config })
    }

    /// Perform a single request without retrying.
    async fn request(&self) -> Result<ContractsResponse> {
        let body = ContractsRequest {
            include_items: false,
            include_check: false,
            include_buy: false,
            refresh_token: self.config.refresh_token.as_deref(),
            language: &self.config.language,
        };

        let response = self.client.post(&self.config.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(AppError::fetch(describe_failure(response).await));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ContractSource for HttpContractSource {
    async fn fetch_contracts(&self) -> Result<Vec<Contract>> {
        let attempts = self.config.max_retries.max(1);
        let delay = Duration::from_secs(self.config.retry_delay_secs);

        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.request().await {
                Ok(response) => {
                    let contracts = decode_contracts(response)?;
                    log::info!("Fetched {} contracts on attempt {}", contracts.len(), attempt);
                    return Ok(contracts);
                }
                Err(e) => {
                    log::warn!("Contract fetch attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(AppError::fetch(format!(
            "failed to get contracts after {} attempts: {}",
            attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}

/// Reads contracts from a local JSON document.
#[derive(Debug, Clone)]
pub struct FileContractSource {
    path: PathBuf,
}

impl FileContractSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ContractSource for FileContractSource {
    async fn fetch_contracts(&self) -> Result<Vec<Contract>> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            AppError::fetch(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let contracts = parse_contracts(&bytes).map_err(|e| match e {
            AppError::MalformedRecord { .. } => e,
            other => AppError::fetch(format!("{}: {}", self.path.display(), other)),
        })?;
        log::info!("Loaded {} contracts from {}", contracts.len(), self.path.display());
        Ok(contracts)
    }
}
