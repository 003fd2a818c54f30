// src/models/mod.rs

//! Domain models for the notifier.
//!
//! This module contains the data structures shared by the pipeline,
//! the external service adapters and the state stores.

mod config;
mod contract;
mod hash_code;

// Re-export all public types
pub use config::{Config, DiscordConfig, RunConfig, SourceConfig, StorageConfig};
pub use contract::Contract;
pub use hash_code::{HashCode, HashCodeSet};
