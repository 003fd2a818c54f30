//! Contract notifier CLI
//!
//! Local execution entry point. For AWS Lambda, use `notifier-lambda`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use notifier::{
    config,
    error::Result,
    pipeline::{RunSettings, Runner},
    services::{
        ConsoleTransport, ContractSource, DiscordTransport, FileContractSource,
        HttpContractSource, NotificationTransport,
    },
    storage::LocalStateStore,
};

/// Contract notifier - reports new and expiring contracts
#[derive(Parser, Debug)]
#[command(
    name = "notifier",
    version,
    about = "Reports new and expiring buyback contracts to Discord"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, classify, notify and persist once
    Run {
        /// Print messages to stdout instead of posting to Discord
        #[arg(long)]
        console: bool,

        /// Read contracts from a local JSON document instead of the source URL
        #[arg(long)]
        contracts_file: Option<PathBuf>,
    },

    /// Validate configuration
    Validate,

    /// Show the persisted state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = config::load_local(&cli.config);
    log::info!("Loaded configuration from {}", cli.config.display());

    let state = LocalStateStore::new(&config.storage.state_file);

    match cli.command {
        Command::Run {
            console,
            contracts_file,
        } => {
            let source: Arc<dyn ContractSource> = match contracts_file {
                Some(path) => Arc::new(FileContractSource::new(path)),
                None => Arc::new(HttpContractSource::new(config.source.clone())?),
            };
            let transport: Arc<dyn NotificationTransport> = if console {
                Arc::new(ConsoleTransport)
            } else {
                Arc::new(DiscordTransport::new(
                    config.discord.clone(),
                    config.source.user_agent.clone(),
                ))
            };

            let runner = Runner::new(
                source,
                transport,
                Arc::new(state),
                RunSettings::from(&config.run),
            );
            let report = runner.run().await?;
            log::info!("{}", serde_json::to_string(&report)?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            validate(&config)?;
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("State file: {}", state.path().display());
            match state.load_document().await? {
                Some(document) => {
                    log::info!("Hash codes: {}", document.hash_codes.len());
                    log::info!("Last updated: {}", document.updated_at);
                }
                None => log::info!("No state stored yet."),
            }
        }
    }

    log::info!("Done!");
    Ok(())
}

fn validate(config: &notifier::models::Config) -> Result<()> {
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    Ok(())
}
