//! In-memory collaborators for driving the runner in tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use notifier::error::{AppError, Result};
use notifier::models::{Contract, HashCode, HashCodeSet};
use notifier::services::{ContractSource, NotificationSession, NotificationTransport};
use notifier::storage::StateGateway;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn contract(code: &str, expires_in_hours: i64) -> Contract {
    Contract::new(
        code,
        now() - Duration::days(2),
        now() + Duration::hours(expires_in_hours),
    )
}

pub fn set_of(codes: &[&str]) -> HashCodeSet {
    codes.iter().map(|c| HashCode::from(*c)).collect()
}

/// Contract source returning a fixed snapshot or failure.
pub struct FakeSource {
    outcome: std::result::Result<Vec<Contract>, AppErrorKind>,
    pub calls: AtomicUsize,
}

#[derive(Clone, Copy)]
pub enum AppErrorKind {
    Fetch,
    Malformed,
}

impl FakeSource {
    pub fn ok(contracts: Vec<Contract>) -> Self {
        Self {
            outcome: Ok(contracts),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(kind: AppErrorKind) -> Self {
        Self {
            outcome: Err(kind),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContractSource for FakeSource {
    async fn fetch_contracts(&self) -> Result<Vec<Contract>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(contracts) => Ok(contracts.clone()),
            Err(AppErrorKind::Fetch) => Err(AppError::fetch("source unreachable")),
            Err(AppErrorKind::Malformed) => {
                Err(AppError::malformed("bad", "contract has no ESI contract"))
            }
        }
    }
}

/// What the fake transport observed.
#[derive(Debug, Default)]
pub struct TransportLog {
    pub opened: usize,
    pub closed: usize,
    pub sent: Vec<String>,
}

/// Transport whose sessions record every block.
#[derive(Default)]
pub struct FakeTransport {
    pub fail_open: bool,
    /// Fail the send with this zero-based index
    pub fail_send_at: Option<usize>,
    pub fail_close: bool,
    pub log: Arc<Mutex<TransportLog>>,
}

impl FakeTransport {
    pub fn sent(&self) -> Vec<String> {
        self.log.lock().unwrap().sent.clone()
    }

    pub fn opened(&self) -> usize {
        self.log.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }
}

#[async_trait]
impl NotificationTransport for FakeTransport {
    async fn open_session(&self) -> Result<Box<dyn NotificationSession>> {
        if self.fail_open {
            return Err(AppError::session("gateway refused"));
        }
        self.log.lock().unwrap().opened += 1;
        Ok(Box::new(FakeSession {
            fail_send_at: self.fail_send_at,
            fail_close: self.fail_close,
            attempts: 0,
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakeSession {
    fail_send_at: Option<usize>,
    fail_close: bool,
    attempts: usize,
    log: Arc<Mutex<TransportLog>>,
}

#[async_trait]
impl NotificationSession for FakeSession {
    async fn send(&mut self, block: &str) -> Result<()> {
        let attempt = self.attempts;
        self.attempts += 1;
        if self.fail_send_at == Some(attempt) {
            return Err(AppError::delivery("channel rejected message"));
        }
        self.log.lock().unwrap().sent.push(block.to_string());
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log.lock().unwrap().closed += 1;
        if self.fail_close {
            return Err(AppError::session("connection reset on close"));
        }
        Ok(())
    }
}

/// State gateway holding the previous set in memory.
#[derive(Default)]
pub struct FakeState {
    pub previous: HashCodeSet,
    pub fail_read: bool,
    pub fail_write: bool,
    pub write_attempts: AtomicUsize,
    pub written: Mutex<Option<HashCodeSet>>,
}

impl FakeState {
    pub fn with_previous(previous: HashCodeSet) -> Self {
        Self {
            previous,
            ..Self::default()
        }
    }

    pub fn written(&self) -> Option<HashCodeSet> {
        self.written.lock().unwrap().clone()
    }

    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateGateway for FakeState {
    async fn read_identifiers(&self) -> Result<HashCodeSet> {
        if self.fail_read {
            return Err(AppError::state("document store unavailable"));
        }
        Ok(self.previous.clone())
    }

    async fn write_identifiers(&self, hash_codes: &HashCodeSet) -> Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_write {
            return Err(AppError::persist("document store unavailable"));
        }
        *self.written.lock().unwrap() = Some(hash_codes.clone());
        Ok(())
    }
}
