//! Console notification transport for local dry runs.

use async_trait::async_trait;

use crate::error::Result;
use crate::services::{NotificationSession, NotificationTransport};

/// Prints message blocks to stdout instead of posting them.
#[derive(Debug, Default, Clone)]
pub struct ConsoleTransport;

#[async_trait]
impl NotificationTransport for ConsoleTransport {
    async fn open_session(&self) -> Result<Box<dyn NotificationSession>> {
        Ok(Box::new(ConsoleSession { sent: 0 }))
    }
}

struct ConsoleSession {
    sent: usize,
}

#[async_trait]
impl NotificationSession for ConsoleSession {
    async fn send(&mut self, block: &str) -> Result<()> {
        self.sent += 1;
        println!("{block}");
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        log::debug!("Console session printed {} blocks", self.sent);
        Ok(())
    }
}
