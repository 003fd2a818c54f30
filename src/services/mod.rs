//! External service layer for the notifier.
//!
//! This module contains the collaborators the run pipeline talks to:
//! - Contract retrieval (`ContractSource`): `HttpContractSource`, `FileContractSource`
//! - Notification delivery (`NotificationTransport`): `DiscordTransport`, `ConsoleTransport`

mod console;
mod contracts;
mod discord;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Contract;

pub use console::ConsoleTransport;
pub use contracts::{FileContractSource, HttpContractSource};
pub use discord::DiscordTransport;

/// Source of the current contract snapshot.
#[async_trait]
pub trait ContractSource: Send + Sync {
    /// Fetch every current contract, in source order.
    ///
    /// Implementations apply their own bounded retry before failing. A record
    /// missing required fields fails the whole fetch.
    async fn fetch_contracts(&self) -> Result<Vec<Contract>>;
}

/// Factory for notification sessions.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Establish a session able to deliver message blocks.
    async fn open_session(&self) -> Result<Box<dyn NotificationSession>>;
}

/// An open connection to a notification destination.
#[async_trait]
pub trait NotificationSession: Send {
    /// Deliver one message block.
    async fn send(&mut self, block: &str) -> Result<()>;

    /// Release the session. Failures here are logged by callers, never fatal.
    async fn close(self: Box<Self>) -> Result<()>;
}
