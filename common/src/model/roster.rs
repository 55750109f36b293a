use serde::{Deserialize, Serialize};

/// Counters describing what a single roster reconciliation pass did.
///
/// This is the payload of `JobStatus::Completed` for reconciliation jobs and is
/// also written to the log at the end of every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Data rows read from the roster, malformed ones included.
    pub rows_read: u64,
    /// Guests created because their id pair was not stored yet.
    pub added: u64,
    /// Existing guests whose name changed.
    pub renamed: u64,
    /// Existing guests confirmed with an identical name.
    pub unchanged: u64,
    /// Rows skipped because they could not be parsed.
    pub skipped: u64,
    /// Store operations that failed and were skipped.
    pub store_errors: u64,
    pub removed_guests: u64,
    pub removed_groups: u64,
}
