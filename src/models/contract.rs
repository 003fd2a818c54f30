//! Contract data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HashCode;

/// A contract fetched from the contract source.
///
/// Two contracts are the same contract iff their hash codes are equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contract {
    /// Contract hash code
    hash_code: HashCode,

    /// When the contract was issued
    issued: DateTime<Utc>,

    /// When the contract expires
    expires: DateTime<Utc>,
}

impl Contract {
    pub fn new(hash_code: impl Into<HashCode>, issued: DateTime<Utc>, expires: DateTime<Utc>) -> Self {
        Self {
            hash_code: hash_code.into(),
            issued,
            expires,
        }
    }

    pub fn hash_code(&self) -> &HashCode {
        &self.hash_code
    }

    pub fn issued(&self) -> DateTime<Utc> {
        self.issued
    }

    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// Whether the contract expires strictly before `deadline`.
    ///
    /// There is no lower bound: contracts that already expired qualify.
    pub fn expires_before(&self, deadline: DateTime<Utc>) -> bool {
        self.expires < deadline
    }
}
