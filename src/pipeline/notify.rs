//! Notification batch building and delivery.

use crate::error::Result;
use crate::pipeline::chunk::{EXPIRING_TITLE, NEW_TITLE, chunk_contracts};
use crate::pipeline::classify::Classification;
use crate::services::NotificationSession;

/// Message blocks produced by one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationBatch {
    pub new_messages: Vec<String>,
    pub expiring_messages: Vec<String>,
}

impl NotificationBatch {
    /// Build the batch for a classification.
    ///
    /// An empty partition contributes no blocks at all, not even a bare header.
    pub fn build(classification: &Classification, limit: usize) -> Self {
        let new_messages = if classification.new.is_empty() {
            Vec::new()
        } else {
            chunk_contracts(NEW_TITLE, &classification.new, limit)
        };
        let expiring_messages = if classification.expiring.is_empty() {
            Vec::new()
        } else {
            chunk_contracts(EXPIRING_TITLE, &classification.expiring, limit)
        };

        Self {
            new_messages,
            expiring_messages,
        }
    }

    pub fn len(&self) -> usize {
        self.new_messages.len() + self.expiring_messages.len()
    }

    /// All blocks in delivery order: the new section, then the expiring section.
    pub fn into_blocks(self) -> impl Iterator<Item = String> {
        self.new_messages.into_iter().chain(self.expiring_messages)
    }
}

/// Deliver every block in order, stopping at the first failure.
///
/// Returns the number of blocks delivered.
pub async fn deliver(session: &mut dyn NotificationSession, batch: NotificationBatch) -> Result<usize> {
    let total = batch.len();
    let mut sent = 0;
    for block in batch.into_blocks() {
        session.send(&block).await?;
        sent += 1;
        log::debug!("Delivered block {}/{}", sent, total);
    }
    Ok(sent)
}
