//! Contract hash codes and the per-run hash code set.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier naming a contract across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashCode(String);

impl HashCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HashCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HashCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for HashCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Unordered set of hash codes seen in a run.
///
/// This is the whole of the state carried between runs. Serializes as a
/// plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashCodeSet(HashSet<HashCode>);

impl HashCodeSet {
    pub fn new() -> Self {
        Self(HashSet::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(HashSet::with_capacity(capacity))
    }

    /// Insert a hash code, returning `true` if it was not already present.
    pub fn insert(&mut self, code: HashCode) -> bool {
        self.0.insert(code)
    }

    pub fn contains(&self, code: &HashCode) -> bool {
        self.0.contains(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hash codes in lexical order, for stable persisted documents.
    pub fn to_sorted_vec(&self) -> Vec<HashCode> {
        let mut codes: Vec<HashCode> = self.0.iter().cloned().collect();
        codes.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        codes
    }
}

impl FromIterator<HashCode> for HashCodeSet {
    fn from_iter<I: IntoIterator<Item = HashCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
