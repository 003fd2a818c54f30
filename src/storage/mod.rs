//! Persistence of the hash codes seen in the last run.
//!
//! The whole state is one document holding a hash code array, replaced
//! wholesale at the end of every run:
//!
//! ```text
//! {
//!   "hash_codes": ["…", "…"],
//!   "updated_at": "2024-03-01T12:00:00Z"
//! }
//! ```
//!
//! - `LocalStateStore`: JSON file, for development and the CLI
//! - `S3StateStore`: S3 object, for the Lambda deployment (`s3` feature)

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{HashCode, HashCodeSet};

// Re-export for convenience
pub use local::LocalStateStore;
#[cfg(feature = "s3")]
pub use s3::S3StateStore;

/// Persisted state document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDocument {
    /// Hash codes seen in the last run, sorted
    pub hash_codes: Vec<HashCode>,
    /// When the document was written
    pub updated_at: DateTime<Utc>,
}

impl StateDocument {
    pub fn new(hash_codes: &HashCodeSet) -> Self {
        Self {
            hash_codes: hash_codes.to_sorted_vec(),
            updated_at: Utc::now(),
        }
    }

    pub fn into_set(self) -> HashCodeSet {
        self.hash_codes.into_iter().collect()
    }
}

/// Gateway to the persisted hash code set.
#[async_trait]
pub trait StateGateway: Send + Sync {
    /// Read the previous run's hash codes.
    ///
    /// Missing state is not an error and yields an empty set.
    async fn read_identifiers(&self) -> Result<HashCodeSet>;

    /// Replace the stored hash codes with `hash_codes`.
    ///
    /// This is a full replace, never a merge. Either the new document is
    /// stored or the previous one remains.
    async fn write_identifiers(&self, hash_codes: &HashCodeSet) -> Result<()>;
}
