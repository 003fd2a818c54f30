// src/lib.rs

//! Contract Notifier Library
//!
//! Detects contracts that are new or nearing expiry since the previous run
//! and posts them to a notification channel in size-bounded messages.

pub mod config;
pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
