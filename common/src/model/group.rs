use crate::model::guest::Guest;
use crate::model::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A household or party that answers one RSVP together.
///
/// Guests are ordered by id and messages by submission order; both are
/// embedded so a single lookup returns everything the RSVP page needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    pub group_id: i64,
    pub guests: Vec<Guest>,
    pub messages: Vec<Message>,
}

impl Group {
    /// Timestamp of the most recent message, if the group ever left one.
    pub fn latest_message(&self) -> Option<DateTime<Utc>> {
        self.messages.iter().map(|m| m.timestamp).max()
    }
}

/// One entry of the `GET /getresponses` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupResponse {
    #[serde(flatten)]
    pub group: Group,
    pub latest_message: Option<DateTime<Utc>>,
}

impl From<Group> for GroupResponse {
    fn from(group: Group) -> Self {
        let latest_message = group.latest_message();
        Self {
            group,
            latest_message,
        }
    }
}
