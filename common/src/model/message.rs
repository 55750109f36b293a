use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A free-text note left by a group when submitting its RSVP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}
