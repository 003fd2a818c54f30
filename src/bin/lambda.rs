//! AWS Lambda entry point for the contract notifier
//!
//! Deploy with `cargo lambda build --release --features lambda`.
//!
//! ## Environment Variables
//!
//! - `S3_BUCKET`: bucket holding config and state (default: `contract-notifications`)
//! - `S3_PREFIX`: key prefix (default: `notifier`)
//! - `CONFIG_S3_PREFIX`: prefix of `config.toml` (default: `{S3_PREFIX}/config`)
//! - `CONTRACTS_URL`, `CONTRACTS_REFRESH_TOKEN`: contract source
//! - `DISCORD_TOKEN`, `DISCORD_CHANNEL_ID`: notification channel
//! - `RUST_LOG`: Log level (e.g., `info`, `debug`)

use lambda_runtime::{Error as LambdaError, service_fn};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notifier::lambda::handler;

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Contract notifier Lambda starting...");
    lambda_runtime::run(service_fn(handler)).await
}
