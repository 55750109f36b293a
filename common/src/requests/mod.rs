use serde::{Deserialize, Serialize};

/// Query string of `GET /findguests`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindGuestsQuery {
    pub name: Option<String>,
}

/// Attendance answer for one guest of the submitting group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GuestRsvp {
    pub id: i64,
    pub attending: bool,
}

/// Body of `POST /submitrsvp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmitRsvpRequest {
    pub group_id: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub guest_rsvps: Vec<GuestRsvp>,
}

/// Acknowledgment returned by `POST /submitrsvp`.
///
/// Guest ids that do not belong to the group are not an error; they are
/// listed in `Ignored` so the caller can tell they had no effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmitRsvpResponse {
    pub status: String,
    pub updated: Vec<i64>,
    pub ignored: Vec<i64>,
}

/// Returned by `POST /api/roster/reconcile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartReconcileResponse {
    pub job_id: String,
}
