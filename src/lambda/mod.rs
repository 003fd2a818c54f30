// src/lambda/mod.rs

//! AWS Lambda handler for the notifier.
//!
//! Each invocation performs exactly one run:
//! 1. Loads config from S3 (falling back to defaults) plus environment overrides
//! 2. Fetches contracts, opens the Discord session and reads the last state concurrently
//! 3. Posts new and expiring contracts to Discord
//! 4. Stores the hash codes seen in this run
//!
//! The payload is ignored. A failed run fails the invocation.

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::config::LambdaConfigLoader;
use crate::error::Result;
use crate::models::StorageConfig;
use crate::pipeline::{RunSettings, Runner};
use crate::services::{DiscordTransport, HttpContractSource};
use crate::storage::S3StateStore;

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    let start = std::time::Instant::now();
    info!("Handling invocation {}", event.context.request_id);

    let runner = build_runner().await.map_err(|e| {
        error!("Lambda setup failed: {}", e);
        LambdaError::from(e)
    })?;

    match runner.run().await {
        Ok(report) => {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            info!("Lambda execution successful in {}ms", elapsed_ms);
            Ok(serde_json::json!({
                "status": "success",
                "report": report,
                "execution_time_ms": elapsed_ms,
            }))
        }
        Err(failure) => {
            error!("Lambda execution failed: {}", failure);
            Err(failure.into())
        }
    }
}

/// Wire the production collaborators from S3 config and the environment.
async fn build_runner() -> Result<Runner> {
    let storage = S3StateStore::from_env(StorageConfig::default().s3_key).await?;
    let loader = LambdaConfigLoader::new(storage.clone(), &LambdaConfigLoader::prefix_from_env());
    let config = loader.load_config().await?;
    config.validate()?;

    let source = HttpContractSource::new(config.source.clone())?;
    let transport = DiscordTransport::new(config.discord.clone(), config.source.user_agent.clone());
    let state = storage.with_key(config.storage.s3_key.clone());

    Ok(Runner::new(
        Arc::new(source),
        Arc::new(transport),
        Arc::new(state),
        RunSettings::from(&config.run),
    ))
}
