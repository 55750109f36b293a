//! # Roster Reconciliation
//!
//! Brings the stored groups and guests in line with the roster while keeping
//! every RSVP answer and message already collected.
//!
//! A pass has two phases:
//!
//! 1. **Merge**: every roster row is applied in source order. Known guests get
//!    their name refreshed, unknown ones are inserted (their group is created
//!    on the fly). Each valid row's id pair is recorded in an in-memory
//!    *confirmed* set.
//! 2. **Sweep**: once the roster has been read to its end, guests missing from
//!    the confirmed set are deleted, then groups left without guests.
//!
//! The sweep only runs after a clean end of input. A roster that cannot be
//! opened leaves the store untouched, and a roster that breaks mid-stream
//! keeps what was merged but deletes nothing.
//!
//! Attendance and messages are never written here.

use crate::roster::{RosterError, RosterReader, RosterRow};
use crate::store::{GuestKey, GuestStore};
use common::model::roster::ReconcileReport;
use log::{error, info, warn};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The roster could not be opened or its header understood.
    #[error("roster unavailable, store left untouched: {0}")]
    SourceUnavailable(#[source] RosterError),

    /// The roster broke after some rows were merged; nothing was removed.
    #[error("roster interrupted, removal skipped: {source}")]
    SourceInterrupted {
        merged: ReconcileReport,
        #[source]
        source: RosterError,
    },
}

/// Runs a full pass against the roster file at `path`.
pub fn reconcile_file<S>(store: &S, path: &Path) -> Result<ReconcileReport, ReconcileError>
where
    S: GuestStore + ?Sized,
{
    let reader = RosterReader::open(path).map_err(|e| {
        error!("Skipping roster reconciliation: {}", e);
        ReconcileError::SourceUnavailable(e)
    })?;
    info!("Reconciling guests from roster {}", path.display());
    reconcile_rows(store, reader)
}

/// Runs a full pass over an already opened row sequence.
pub fn reconcile_rows<S, I>(store: &S, rows: I) -> Result<ReconcileReport, ReconcileError>
where
    S: GuestStore + ?Sized,
    I: IntoIterator<Item = Result<RosterRow, RosterError>>,
{
    let mut report = ReconcileReport::default();
    let mut confirmed = HashSet::new();

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(e) if e.is_row_level() => {
                report.rows_read += 1;
                report.skipped += 1;
                warn!("Skipping roster row: {}", e);
                continue;
            }
            Err(e) => {
                error!(
                    "Roster stopped after {} rows, no guest will be removed: {}",
                    report.rows_read, e
                );
                return Err(ReconcileError::SourceInterrupted {
                    merged: report,
                    source: e,
                });
            }
        };
        report.rows_read += 1;
        merge_row(store, &row, &mut confirmed, &mut report);
    }

    sweep(store, &confirmed, &mut report);

    info!(
        "Roster reconciled: {} rows, {} added, {} renamed, {} unchanged, {} skipped, \
         {} guests removed, {} groups removed, {} store errors",
        report.rows_read,
        report.added,
        report.renamed,
        report.unchanged,
        report.skipped,
        report.removed_guests,
        report.removed_groups,
        report.store_errors,
    );
    Ok(report)
}

fn merge_row<S>(
    store: &S,
    row: &RosterRow,
    confirmed: &mut HashSet<GuestKey>,
    report: &mut ReconcileReport,
) where
    S: GuestStore + ?Sized,
{
    let key = GuestKey::new(row.group_id, row.guest_id);
    // Confirmed before touching the store: a failed write must not get the
    // guest swept.
    confirmed.insert(key);

    let outcome = store.find_guest(key).and_then(|existing| match existing {
        Some(guest) if guest.name == row.name => Ok(Merge::Unchanged),
        Some(guest) => store
            .update_guest_name(key, &row.name)
            .map(|_| Merge::Renamed(guest.name)),
        None => store.insert_guest(key, &row.name).map(|inserted| {
            if inserted {
                Merge::Added
            } else {
                Merge::Unchanged
            }
        }),
    });

    match outcome {
        Ok(Merge::Added) => {
            report.added += 1;
            info!("New guest {} '{}'", key, row.name);
        }
        Ok(Merge::Renamed(previous)) => {
            report.renamed += 1;
            info!("Guest {} renamed from '{}' to '{}'", key, previous, row.name);
        }
        Ok(Merge::Unchanged) => report.unchanged += 1,
        Err(e) => {
            report.store_errors += 1;
            warn!("Could not merge roster guest {}: {}", key, e);
        }
    }
}

enum Merge {
    Added,
    Renamed(String),
    Unchanged,
}

fn sweep<S>(store: &S, confirmed: &HashSet<GuestKey>, report: &mut ReconcileReport)
where
    S: GuestStore + ?Sized,
{
    match store.remove_guests_not_in(confirmed) {
        Ok(removed) => {
            for guest in &removed {
                info!("Removed guest {} '{}'", guest.key, guest.name);
            }
            report.removed_guests += removed.len() as u64;
        }
        Err(e) => {
            report.store_errors += 1;
            warn!("Could not remove guests missing from the roster: {}", e);
        }
    }

    match store.remove_empty_groups() {
        Ok(removed) => {
            for group_id in &removed {
                info!("Removed empty group {}", group_id);
            }
            report.removed_groups += removed.len() as u64;
        }
        Err(e) => {
            report.store_errors += 1;
            warn!("Could not remove empty groups: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GuestRecord, SqliteStore, StoreError};
    use chrono::{DateTime, Utc};
    use common::model::group::{Group, GroupResponse};
    use std::io::Write;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn key(group_id: i64, guest_id: i64) -> GuestKey {
        GuestKey::new(group_id, guest_id)
    }

    fn rows(list: &[(i64, i64, &str)]) -> Vec<Result<RosterRow, RosterError>> {
        list.iter()
            .map(|&(group, guest, name)| Ok(RosterRow::new(group, guest, name)))
            .collect()
    }

    fn snapshot(store: &SqliteStore) -> Vec<GroupResponse> {
        store.list_groups_with_latest_message().unwrap()
    }

    #[test]
    fn scenario_keeps_answers_and_replaces_dropped_guest() {
        let store = store();
        store.insert_guest(key(1, 1), "Alice").unwrap();
        store.insert_guest(key(1, 2), "Bob").unwrap();
        store.set_attendance(key(1, 1), true).unwrap();

        let report =
            reconcile_rows(&store, rows(&[(1, 1, "Alice"), (1, 3, "Carol")])).unwrap();

        let group = store.get_group(1).unwrap().expect("group 1 survives");
        let guests: Vec<(i64, &str, Option<bool>)> = group
            .guests
            .iter()
            .map(|g| (g.id, g.name.as_str(), g.attending))
            .collect();
        assert_eq!(guests, vec![(1, "Alice", Some(true)), (3, "Carol", None)]);
        assert_eq!(report.added, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.removed_guests, 1);
        assert_eq!(report.removed_groups, 0);
    }

    #[test]
    fn group_missing_from_roster_is_removed() {
        let store = store();
        store.insert_guest(key(2, 5), "Dan").unwrap();
        store.insert_guest(key(1, 1), "Alice").unwrap();

        let report = reconcile_rows(&store, rows(&[(1, 1, "Alice")])).unwrap();

        assert!(store.get_group(2).unwrap().is_none());
        assert!(store.get_group(1).unwrap().is_some());
        assert_eq!(report.removed_groups, 1);
    }

    #[test]
    fn second_pass_with_same_roster_changes_nothing() {
        let store = store();
        let roster = [(1, 1, "Alice"), (1, 2, "Bob"), (2, 1, "Carol")];
        reconcile_rows(&store, rows(&roster)).unwrap();
        store.set_attendance(key(1, 2), false).unwrap();
        store.append_message(1, "we'll be there", Utc::now()).unwrap();
        let first = snapshot(&store);

        let report = reconcile_rows(&store, rows(&roster)).unwrap();

        assert_eq!(snapshot(&store), first);
        assert_eq!(report.unchanged, 3);
        assert_eq!(report.added + report.renamed + report.removed_guests, 0);
    }

    #[test]
    fn rename_touches_only_the_name() {
        let store = store();
        store.insert_guest(key(1, 1), "Alice").unwrap();
        store.set_attendance(key(1, 1), false).unwrap();
        store.append_message(1, "regrets", Utc::now()).unwrap();

        let report = reconcile_rows(&store, rows(&[(1, 1, "Alice Smith")])).unwrap();

        let group = store.get_group(1).unwrap().unwrap();
        assert_eq!(group.guests[0].name, "Alice Smith");
        assert_eq!(group.guests[0].attending, Some(false));
        assert_eq!(group.messages.len(), 1);
        assert_eq!(report.renamed, 1);
    }

    #[test]
    fn new_rows_share_one_new_group() {
        let store = store();
        let report = reconcile_rows(&store, rows(&[(7, 1, "Eve"), (7, 2, "Frank")])).unwrap();

        let groups = snapshot(&store);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group.group_id, 7);
        assert!(groups[0].group.guests.iter().all(|g| g.attending.is_none()));
        assert_eq!(report.added, 2);
    }

    #[test]
    fn duplicate_rows_keep_the_last_name() {
        let store = store();
        reconcile_rows(&store, rows(&[(1, 1, "Al"), (1, 1, "Alice")])).unwrap();

        let group = store.get_group(1).unwrap().unwrap();
        assert_eq!(group.guests.len(), 1);
        assert_eq!(group.guests[0].name, "Alice");
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let store = store();
        store.insert_guest(key(1, 1), "Alice").unwrap();
        let input = vec![
            Err(RosterError::Malformed {
                line: 2,
                reason: "GuestGroup 'x' is not an integer".to_string(),
            }),
            Ok(RosterRow::new(1, 1, "Alice")),
        ];

        let report = reconcile_rows(&store, input).unwrap();

        assert_eq!(report.rows_read, 2);
        assert_eq!(report.skipped, 1);
        assert!(store.find_guest(key(1, 1)).unwrap().is_some());
    }

    #[test]
    fn missing_roster_leaves_store_untouched() {
        let store = store();
        store.insert_guest(key(1, 1), "Alice").unwrap();
        store.set_attendance(key(1, 1), true).unwrap();
        let before = snapshot(&store);
        let dir = tempfile::tempdir().unwrap();

        let err = reconcile_file(&store, &dir.path().join("guests.csv")).unwrap_err();

        assert!(matches!(err, ReconcileError::SourceUnavailable(_)));
        assert_eq!(snapshot(&store), before);
    }

    #[test]
    fn interrupted_roster_merges_but_does_not_sweep() {
        let store = store();
        store.insert_guest(key(1, 1), "Alice").unwrap();
        store.insert_guest(key(2, 1), "Dan").unwrap();
        let broken = csv::Error::from(std::io::Error::other("disk went away"));
        let input = vec![Ok(RosterRow::new(3, 1, "Grace")), Err(RosterError::Read(broken))];

        let err = reconcile_rows(&store, input).unwrap_err();

        match err {
            ReconcileError::SourceInterrupted { merged, .. } => assert_eq!(merged.added, 1),
            other => panic!("unexpected error: {}", other),
        }
        assert!(store.find_guest(key(1, 1)).unwrap().is_some());
        assert!(store.find_guest(key(2, 1)).unwrap().is_some());
        assert!(store.find_guest(key(3, 1)).unwrap().is_some());
    }

    /// Serves `data`, then fails every further read.
    struct BreaksAfter(std::io::Cursor<Vec<u8>>);

    impl std::io::Read for BreaksAfter {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match std::io::Read::read(&mut self.0, buf)? {
                0 => Err(std::io::Error::other("disk went away")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn roster_failing_mid_read_merges_but_does_not_sweep() {
        let store = store();
        store.insert_guest(key(1, 1), "Alice").unwrap();
        store.insert_guest(key(2, 1), "Dan").unwrap();
        let data = b"GuestGroup,GuestId,GuestName\n3,1,Grace\n".to_vec();
        let source = BreaksAfter(std::io::Cursor::new(data));
        let reader = RosterReader::from_reader(source).unwrap();

        let err = reconcile_rows(&store, reader).unwrap_err();

        match err {
            ReconcileError::SourceInterrupted { merged, source } => {
                assert_eq!(merged.added, 1);
                assert!(matches!(source, RosterError::Read(_)));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(store.find_guest(key(1, 1)).unwrap().is_some());
        assert!(store.find_guest(key(2, 1)).unwrap().is_some());
        assert!(store.find_guest(key(3, 1)).unwrap().is_some());
    }

    #[test]
    fn header_only_roster_clears_the_store() {
        let store = store();
        store.insert_guest(key(1, 1), "Alice").unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "GuestGroup,GuestId,GuestName").unwrap();

        let report = reconcile_file(&store, file.path()).unwrap();

        assert_eq!(report.removed_guests, 1);
        assert!(snapshot(&store).is_empty());
    }

    #[test]
    fn reconciles_from_a_roster_file() {
        let store = store();
        store.insert_guest(key(1, 2), "Bob").unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "GuestGroup;GuestId;GuestName\n1;1;Alice\nbad;row;here\n1;3;Carol\n").unwrap();

        let report = reconcile_file(&store, file.path()).unwrap();

        assert_eq!(report.rows_read, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.added, 2);
        assert_eq!(report.removed_guests, 1);
        assert!(store.find_guest(key(1, 2)).unwrap().is_none());
    }

    /// Delegates to SQLite but fails every write for one guest.
    struct FlakyStore {
        inner: SqliteStore,
        broken: GuestKey,
    }

    impl FlakyStore {
        fn check(&self, key: GuestKey) -> Result<(), StoreError> {
            if key == self.broken {
                return Err(StoreError::Poisoned);
            }
            Ok(())
        }
    }

    impl GuestStore for FlakyStore {
        fn find_guest(&self, key: GuestKey) -> Result<Option<GuestRecord>, StoreError> {
            self.inner.find_guest(key)
        }
        fn update_guest_name(&self, key: GuestKey, name: &str) -> Result<bool, StoreError> {
            self.check(key)?;
            self.inner.update_guest_name(key, name)
        }
        fn insert_guest(&self, key: GuestKey, name: &str) -> Result<bool, StoreError> {
            self.check(key)?;
            self.inner.insert_guest(key, name)
        }
        fn remove_guests_not_in(
            &self,
            keep: &HashSet<GuestKey>,
        ) -> Result<Vec<GuestRecord>, StoreError> {
            self.inner.remove_guests_not_in(keep)
        }
        fn remove_empty_groups(&self) -> Result<Vec<i64>, StoreError> {
            self.inner.remove_empty_groups()
        }
        fn find_group_by_guest_name(&self, name: &str) -> Result<Option<Group>, StoreError> {
            self.inner.find_group_by_guest_name(name)
        }
        fn get_group(&self, group_id: i64) -> Result<Option<Group>, StoreError> {
            self.inner.get_group(group_id)
        }
        fn set_attendance(&self, key: GuestKey, attending: bool) -> Result<bool, StoreError> {
            self.inner.set_attendance(key, attending)
        }
        fn append_message(
            &self,
            group_id: i64,
            text: &str,
            timestamp: DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            self.inner.append_message(group_id, text, timestamp)
        }
        fn list_groups_with_latest_message(&self) -> Result<Vec<GroupResponse>, StoreError> {
            self.inner.list_groups_with_latest_message()
        }
    }

    #[test]
    fn store_error_on_one_row_does_not_abort_or_sweep_it() {
        let inner = store();
        inner.insert_guest(key(1, 1), "Alice").unwrap();
        inner.set_attendance(key(1, 1), true).unwrap();
        let flaky = FlakyStore {
            inner: inner.clone(),
            broken: key(1, 1),
        };

        let report =
            reconcile_rows(&flaky, rows(&[(1, 1, "Alicia"), (1, 2, "Bob")])).unwrap();

        assert_eq!(report.store_errors, 1);
        assert_eq!(report.added, 1);
        let alice = inner.find_guest(key(1, 1)).unwrap().expect("not swept");
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.attending, Some(true));
    }
}
