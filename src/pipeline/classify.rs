//! Classification of a contract snapshot against the previous run.
//!
//! Splits the snapshot into contracts that were not seen in the previous
//! run and contracts expiring within the horizon. The two partitions may
//! overlap: a brand new contract that expires soon appears in both.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Contract, HashCodeSet};

/// Result of classifying one snapshot.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Contracts whose hash code was absent from the previous run
    pub new: Vec<Contract>,
    /// Contracts expiring before `now + horizon`
    pub expiring: Vec<Contract>,
    /// Every hash code in the snapshot
    pub all: HashCodeSet,
}

impl Classification {
    /// Whether there is anything to notify about.
    pub fn has_notifications(&self) -> bool {
        !self.new.is_empty() || !self.expiring.is_empty()
    }
}

/// Classify `snapshot` against the `previous` run's hash codes.
///
/// Snapshot order is preserved within both partitions. A hash code that
/// occurs more than once in the snapshot is reported as new at most once,
/// for its first occurrence; the expiring partition is evaluated per record.
pub fn classify(
    snapshot: &[Contract],
    previous: &HashCodeSet,
    now: DateTime<Utc>,
    horizon: Duration,
) -> Classification {
    let deadline = now + horizon;
    let mut result = Classification {
        all: HashCodeSet::with_capacity(snapshot.len()),
        ..Classification::default()
    };

    for contract in snapshot {
        let first_sighting = result.all.insert(contract.hash_code().clone());
        if first_sighting && !previous.contains(contract.hash_code()) {
            result.new.push(contract.clone());
        }
        if contract.expires_before(deadline) {
            result.expiring.push(contract.clone());
        }
    }

    result
}
