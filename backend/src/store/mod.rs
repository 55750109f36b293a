//! # Guest Record Store
//!
//! Persistence for groups, their embedded guests and their messages.
//!
//! The reconciliation engine and the HTTP services only talk to the store
//! through the [`GuestStore`] trait. Every operation is scoped to the
//! addressed guest or group; nothing here re-validates identifier uniqueness,
//! that is enforced by the schema's primary keys.
//!
//! The only implementation shipped is [`SqliteStore`].

mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use common::model::group::{Group, GroupResponse};
use std::collections::HashSet;
use std::fmt;

/// Identifier pair of a guest, unique across the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuestKey {
    pub group_id: i64,
    pub guest_id: i64,
}

impl GuestKey {
    pub fn new(group_id: i64, guest_id: i64) -> Self {
        Self { group_id, guest_id }
    }
}

impl fmt::Display for GuestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group_id, self.guest_id)
    }
}

/// A guest row as stored, including its owning group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestRecord {
    pub key: GuestKey,
    pub name: String,
    pub attending: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store connection lock poisoned")]
    Poisoned,
}

/// Operations the rest of the backend needs from the guest database.
pub trait GuestStore {
    fn find_guest(&self, key: GuestKey) -> Result<Option<GuestRecord>, StoreError>;

    /// Sets the name of one guest. Returns `false` if the guest does not exist.
    fn update_guest_name(&self, key: GuestKey, name: &str) -> Result<bool, StoreError>;

    /// Inserts a guest that has not responded yet, creating its group first
    /// when needed. Returns `false` if the guest already existed, in which
    /// case nothing is changed.
    fn insert_guest(&self, key: GuestKey, name: &str) -> Result<bool, StoreError>;

    /// Deletes every guest whose key is not in `keep` and returns them.
    fn remove_guests_not_in(
        &self,
        keep: &HashSet<GuestKey>,
    ) -> Result<Vec<GuestRecord>, StoreError>;

    /// Deletes every group left without guests, along with its messages.
    fn remove_empty_groups(&self) -> Result<Vec<i64>, StoreError>;

    /// Case-insensitive lookup of the group owning a guest with this name.
    fn find_group_by_guest_name(&self, name: &str) -> Result<Option<Group>, StoreError>;

    fn get_group(&self, group_id: i64) -> Result<Option<Group>, StoreError>;

    /// Records an RSVP answer. Returns `false` if the guest does not exist.
    fn set_attendance(&self, key: GuestKey, attending: bool) -> Result<bool, StoreError>;

    /// Appends a message to a group. Returns `false` if the group does not exist.
    fn append_message(
        &self,
        group_id: i64,
        text: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    fn list_groups_with_latest_message(&self) -> Result<Vec<GroupResponse>, StoreError>;
}
