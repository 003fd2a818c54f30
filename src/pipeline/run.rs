// src/pipeline/run.rs

//! Run orchestration.
//!
//! One run moves through these stages:
//!
//! ```text
//! Idle → Fetching & Opening → Classifying → Notifying → Persisting → Done
//!                 ╲                              ╲            ╲
//!                  ╰──────────────────────────────┴────────────┴──→ Failed(stage, cause)
//! ```
//!
//! The contract fetch, the notification session and the previous state read
//! run concurrently and are all awaited before branching, so a slow session
//! never hides a fetch failure. Once a snapshot has been classified, the new
//! state is persisted whether or not delivery succeeded; a delivery failure
//! still takes precedence as the reported cause.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::error::AppError;
use crate::models::RunConfig;
use crate::pipeline::classify::classify;
use crate::pipeline::notify::{NotificationBatch, deliver};
use crate::services::{ContractSource, NotificationSession, NotificationTransport};
use crate::storage::StateGateway;

/// Stage of a run, used for logging and to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Fetching,
    OpeningSession,
    ReadingState,
    Classifying,
    Notifying,
    Persisting,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Fetching => "fetch",
            RunStage::OpeningSession => "session open",
            RunStage::ReadingState => "state read",
            RunStage::Classifying => "classify",
            RunStage::Notifying => "notify",
            RunStage::Persisting => "persist",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a run: the stage that failed and the surfaced cause.
#[derive(Debug, Error)]
#[error("{stage} failed: {cause}")]
pub struct RunFailure {
    pub stage: RunStage,
    #[source]
    pub cause: AppError,
}

impl RunFailure {
    pub fn new(stage: RunStage, cause: AppError) -> Self {
        Self { stage, cause }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Contracts in the fetched snapshot
    pub total_contracts: usize,
    /// Contracts not seen in the previous run
    pub new_contracts: usize,
    /// Contracts expiring within the horizon
    pub expiring_contracts: usize,
    /// Message blocks delivered
    pub messages_sent: usize,
    /// Hash codes written as the new state
    pub persisted_hash_codes: usize,
}

/// Tunables for a run.
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub expiry_horizon: Duration,
    pub char_limit: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings::from(&RunConfig::default())
    }
}

impl From<&RunConfig> for RunSettings {
    fn from(config: &RunConfig) -> Self {
        Self {
            expiry_horizon: config.expiry_horizon(),
            char_limit: config.char_limit,
        }
    }
}

/// Drives a single fetch → classify → notify → persist run.
pub struct Runner {
    source: Arc<dyn ContractSource>,
    transport: Arc<dyn NotificationTransport>,
    state: Arc<dyn StateGateway>,
    settings: RunSettings,
}

impl Runner {
    pub fn new(
        source: Arc<dyn ContractSource>,
        transport: Arc<dyn NotificationTransport>,
        state: Arc<dyn StateGateway>,
        settings: RunSettings,
    ) -> Self {
        Self {
            source,
            transport,
            state,
            settings,
        }
    }

    /// Run once, classifying against the time the snapshot arrived.
    pub async fn run(&self) -> Result<RunReport, RunFailure> {
        self.execute(None).await
    }

    /// Run once, classifying against a fixed `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunReport, RunFailure> {
        self.execute(Some(now)).await
    }

    async fn execute(&self, now: Option<DateTime<Utc>>) -> Result<RunReport, RunFailure> {
        log::info!("Fetching contracts, opening notification session and reading previous state");
        let (fetched, opened, previous) = tokio::join!(
            self.source.fetch_contracts(),
            self.transport.open_session(),
            self.state.read_identifiers(),
        );

        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(cause) => {
                if let Ok(session) = opened {
                    release(session).await;
                }
                return Err(fail(RunStage::Fetching, cause));
            }
        };

        let mut session = match opened {
            Ok(session) => session,
            Err(cause) => return Err(fail(RunStage::OpeningSession, cause)),
        };

        let previous = match previous {
            Ok(previous) => previous,
            Err(cause) => {
                release(session).await;
                return Err(fail(RunStage::ReadingState, cause));
            }
        };

        log::info!(
            "[{}] {} contracts against {} previously seen hash codes",
            RunStage::Classifying,
            snapshot.len(),
            previous.len()
        );
        let now = now.unwrap_or_else(Utc::now);
        let classification = classify(&snapshot, &previous, now, self.settings.expiry_horizon);
        log::info!(
            "{} new, {} expiring within {}h",
            classification.new.len(),
            classification.expiring.len(),
            self.settings.expiry_horizon.num_hours()
        );

        let mut report = RunReport {
            total_contracts: snapshot.len(),
            new_contracts: classification.new.len(),
            expiring_contracts: classification.expiring.len(),
            ..RunReport::default()
        };

        if !classification.has_notifications() {
            log::info!("Nothing new or expiring; no messages to send");
        }
        let batch = NotificationBatch::build(&classification, self.settings.char_limit);
        log::info!("[{}] delivering {} message blocks", RunStage::Notifying, batch.len());
        let delivered = deliver(session.as_mut(), batch).await;
        release(session).await;

        log::info!(
            "[{}] writing {} hash codes",
            RunStage::Persisting,
            classification.all.len()
        );
        let persisted = self.state.write_identifiers(&classification.all).await;

        match (delivered, persisted) {
            (Err(delivery), persisted) => {
                if let Err(persist) = persisted {
                    log::error!("State was not stored either: {}", persist);
                }
                Err(fail(RunStage::Notifying, delivery))
            }
            (Ok(_), Err(persist)) => Err(fail(RunStage::Persisting, persist)),
            (Ok(sent), Ok(())) => {
                report.messages_sent = sent;
                report.persisted_hash_codes = classification.all.len();
                log::info!(
                    "Run complete: {} contracts, {} new, {} expiring, {} messages sent",
                    report.total_contracts,
                    report.new_contracts,
                    report.expiring_contracts,
                    report.messages_sent
                );
                Ok(report)
            }
        }
    }
}

fn fail(stage: RunStage, cause: AppError) -> RunFailure {
    log::error!("Run failed at {} stage: {}", stage, cause);
    RunFailure::new(stage, cause)
}

/// Close a session, logging rather than propagating failures.
async fn release(session: Box<dyn NotificationSession>) {
    if let Err(e) = session.close().await {
        log::warn!("Failed to close notification session: {}", e);
    }
}
