use serde::{Deserialize, Serialize};

/// A single invitee as embedded in its owning [`Group`](crate::model::group::Group).
///
/// `attending` is tri-state: `None` means the guest has not responded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Guest {
    pub id: i64,
    pub name: String,
    pub attending: Option<bool>,
}
