use crate::model::roster::ReconcileReport;
use serde::{Deserialize, Serialize};

/// Lifecycle of a background roster reconciliation job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed(ReconcileReport),
    Failed(String),
}
