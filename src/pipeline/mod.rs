//! Run pipeline for contract notifications.
//!
//! - `classify`: split a snapshot into new and expiring contracts
//! - `chunk`: pack contract lines into size-bounded message blocks
//! - `notify`: build the notification batch and deliver it
//! - `run`: orchestrate fetch, classification, delivery and persistence

pub mod chunk;
pub mod classify;
pub mod notify;
pub mod run;

pub use chunk::{chunk, chunk_contracts, format_contract_line};
pub use classify::{Classification, classify};
pub use notify::{NotificationBatch, deliver};
pub use run::{RunFailure, RunReport, RunSettings, RunStage, Runner};
