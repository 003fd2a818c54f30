// src/error.rs

//! Unified error handling for the notifier.

use std::fmt;

use thiserror::Error;

/// Result type alias for notifier operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Contract source unreachable or retries exhausted
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A fetched contract record is unusable
    #[error("Malformed contract record {record}: {message}")]
    MalformedRecord { record: String, message: String },

    /// Notification session could not be opened
    #[error("Session error: {0}")]
    Session(String),

    /// A message block could not be delivered
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Previous run state could not be read
    #[error("State read error: {0}")]
    StateRead(String),

    /// Current run state could not be written
    #[error("Persist error: {0}")]
    Persist(String),

    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error.
    pub fn fetch(message: impl fmt::Display) -> Self {
        Self::Fetch(message.to_string())
    }

    /// Create a malformed record error naming the offending record.
    pub fn malformed(record: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedRecord {
            record: record.into(),
            message: message.to_string(),
        }
    }

    /// Create a session error.
    pub fn session(message: impl fmt::Display) -> Self {
        Self::Session(message.to_string())
    }

    /// Create a delivery error.
    pub fn delivery(message: impl fmt::Display) -> Self {
        Self::Delivery(message.to_string())
    }

    /// Create a state read error.
    pub fn state(message: impl fmt::Display) -> Self {
        Self::StateRead(message.to_string())
    }

    /// Create a persist error.
    pub fn persist(message: impl fmt::Display) -> Self {
        Self::Persist(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
