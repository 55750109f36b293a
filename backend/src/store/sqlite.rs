use crate::store::{GuestKey, GuestRecord, GuestStore, StoreError};
use chrono::{DateTime, Utc};
use common::model::group::{Group, GroupResponse};
use common::model::guest::Guest;
use common::model::message::Message;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS groups (
        group_id INTEGER PRIMARY KEY
    );
    CREATE TABLE IF NOT EXISTS guests (
        group_id  INTEGER NOT NULL REFERENCES groups(group_id) ON DELETE CASCADE,
        guest_id  INTEGER NOT NULL,
        name      TEXT NOT NULL,
        attending INTEGER,
        PRIMARY KEY (group_id, guest_id)
    );
    CREATE TABLE IF NOT EXISTS messages (
        id       INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id INTEGER NOT NULL REFERENCES groups(group_id) ON DELETE CASCADE,
        text     TEXT NOT NULL,
        created  TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS messages_group_idx ON messages(group_id);
";

/// SQLite-backed [`GuestStore`].
///
/// A single connection is shared behind a mutex, so each store call runs to
/// completion before the next one starts. Cloning is cheap and yields a
/// handle to the same connection, which is how the store is shared between
/// actix workers and background jobs.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and makes sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Opened guest database at {}", path.display());
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn load_group(conn: &Connection, group_id: i64) -> Result<Option<Group>, rusqlite::Error> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM groups WHERE group_id = ?1",
            params![group_id],
            |_| Ok(()),
        )
        .optional()?;
    if exists.is_none() {
        return Ok(None);
    }

    let guests = conn
        .prepare(
            "SELECT guest_id, name, attending FROM guests WHERE group_id = ?1 ORDER BY guest_id",
        )?
        .query_map(params![group_id], |row| {
            Ok(Guest {
                id: row.get(0)?,
                name: row.get(1)?,
                attending: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let messages = conn
        .prepare("SELECT text, created FROM messages WHERE group_id = ?1 ORDER BY id")?
        .query_map(params![group_id], |row| {
            Ok(Message {
                text: row.get(0)?,
                timestamp: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Group {
        group_id,
        guests,
        messages,
    }))
}

fn all_guests(conn: &Connection) -> Result<Vec<GuestRecord>, rusqlite::Error> {
    conn.prepare("SELECT group_id, guest_id, name, attending FROM guests")?
        .query_map([], |row| {
            Ok(GuestRecord {
                key: GuestKey::new(row.get(0)?, row.get(1)?),
                name: row.get(2)?,
                attending: row.get(3)?,
            })
        })?
        .collect()
}

impl GuestStore for SqliteStore {
    fn find_guest(&self, key: GuestKey) -> Result<Option<GuestRecord>, StoreError> {
        let conn = self.conn()?;
        let guest = conn
            .query_row(
                "SELECT name, attending FROM guests WHERE group_id = ?1 AND guest_id = ?2",
                params![key.group_id, key.guest_id],
                |row| {
                    Ok(GuestRecord {
                        key,
                        name: row.get(0)?,
                        attending: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(guest)
    }

    fn update_guest_name(&self, key: GuestKey, name: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE guests SET name = ?3 WHERE group_id = ?1 AND guest_id = ?2",
            params![key.group_id, key.guest_id, name],
        )?;
        Ok(changed == 1)
    }

    fn insert_guest(&self, key: GuestKey, name: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO groups (group_id) VALUES (?1)",
            params![key.group_id],
        )?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO guests (group_id, guest_id, name) VALUES (?1, ?2, ?3)",
            params![key.group_id, key.guest_id, name],
        )?;
        tx.commit()?;
        Ok(inserted == 1)
    }

    fn remove_guests_not_in(
        &self,
        keep: &HashSet<GuestKey>,
    ) -> Result<Vec<GuestRecord>, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let stale: Vec<GuestRecord> = all_guests(&tx)?
            .into_iter()
            .filter(|guest| !keep.contains(&guest.key))
            .collect();
        {
            let mut delete =
                tx.prepare("DELETE FROM guests WHERE group_id = ?1 AND guest_id = ?2")?;
            for guest in &stale {
                delete.execute(params![guest.key.group_id, guest.key.guest_id])?;
            }
        }
        tx.commit()?;
        Ok(stale)
    }

    fn remove_empty_groups(&self) -> Result<Vec<i64>, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let empty: Vec<i64> = tx
            .prepare(
                "SELECT group_id FROM groups g
                 WHERE NOT EXISTS (SELECT 1 FROM guests WHERE guests.group_id = g.group_id)
                 ORDER BY group_id",
            )?
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;
        {
            let mut delete = tx.prepare("DELETE FROM groups WHERE group_id = ?1")?;
            for group_id in &empty {
                delete.execute(params![group_id])?;
            }
        }
        tx.commit()?;
        Ok(empty)
    }

    fn find_group_by_guest_name(&self, name: &str) -> Result<Option<Group>, StoreError> {
        let wanted = name.trim().to_lowercase();
        let conn = self.conn()?;
        // SQLite's lower() only folds ASCII, so names are compared here.
        let owner = all_guests(&conn)?
            .into_iter()
            .filter(|guest| guest.name.trim().to_lowercase() == wanted)
            .map(|guest| guest.key)
            .min();
        match owner {
            Some(key) => Ok(load_group(&conn, key.group_id)?),
            None => Ok(None),
        }
    }

    fn get_group(&self, group_id: i64) -> Result<Option<Group>, StoreError> {
        let conn = self.conn()?;
        Ok(load_group(&conn, group_id)?)
    }

    fn set_attendance(&self, key: GuestKey, attending: bool) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE guests SET attending = ?3 WHERE group_id = ?1 AND guest_id = ?2",
            params![key.group_id, key.guest_id, attending],
        )?;
        Ok(changed == 1)
    }

    fn append_message(
        &self,
        group_id: i64,
        text: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO messages (group_id, text, created)
             SELECT ?1, ?2, ?3 WHERE EXISTS (SELECT 1 FROM groups WHERE group_id = ?1)",
            params![group_id, text, timestamp],
        )?;
        Ok(inserted == 1)
    }

    fn list_groups_with_latest_message(&self) -> Result<Vec<GroupResponse>, StoreError> {
        let conn = self.conn()?;
        let ids: Vec<i64> = conn
            .prepare("SELECT group_id FROM groups ORDER BY group_id")?
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut groups = Vec::with_capacity(ids.len());
        for group_id in ids {
            if let Some(group) = load_group(&conn, group_id)? {
                groups.push(GroupResponse::from(group));
            }
        }
        Ok(groups)
    }
}
