use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_derive::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::User;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: i32,
    email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct TripRecord {
    id: i32,
    user_id: i32,
    launch_id: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default)]
    trips: Vec<TripRecord>,
}

impl Tables {
    fn next_user_id(&self) -> Result<i32> {
        next_id(self.users.iter().map(|user| user.id), "users")
    }

    fn next_trip_id(&self) -> Result<i32> {
        next_id(self.trips.iter().map(|trip| trip.id), "trips")
    }
}

fn next_id<I: Iterator<Item = i32>>(ids: I, table: &'static str) -> Result<i32> {
    ids.max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(Error::StoreExhausted(table))
}

///
/// Users and their booked trips
///
/// Lives in memory, or in a JSON snapshot file which is read on open and
/// rewritten after every change.
#[derive(Debug)]
pub struct Store {
    path: Option<PathBuf>,
    tables: Mutex<Tables>,
}

impl Store {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Opens the snapshot at `path`, starting empty when the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = match fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Tables::default(),
            Err(err) => return Err(err.into()),
        };
        info!(
            path = %path.display(),
            users = tables.users.len(),
            trips = tables.trips.len(),
            "opened user store"
        );
        Ok(Self {
            path: Some(path),
            tables: Mutex::new(tables),
        })
    }

    pub fn find_user(&self, email: &str) -> Option<User> {
        let tables = self.tables.lock();
        tables
            .users
            .iter()
            .find(|user| user.email == email)
            .map(|user| User::new(user.id, user.email.as_str()))
    }

    pub fn find_or_create_user(&self, email: &str) -> Result<User> {
        let mut tables = self.tables.lock();
        if let Some(user) = tables.users.iter().find(|user| user.email == email) {
            return Ok(User::new(user.id, user.email.as_str()));
        }
        let record = UserRecord {
            id: tables.next_user_id()?,
            email: email.to_string(),
        };
        let mut staged = tables.clone();
        staged.users.push(record.clone());
        self.flush(&staged)?;
        *tables = staged;
        debug!(user_id = record.id, "created user");
        Ok(User::new(record.id, record.email))
    }

    pub fn is_booked(&self, user_id: i32, launch_id: i32) -> bool {
        self.tables
            .lock()
            .trips
            .iter()
            .any(|trip| trip.user_id == user_id && trip.launch_id == launch_id)
    }

    /// Launch ids booked by the user, in booking order.
    pub fn launch_ids_by_user(&self, user_id: i32) -> Vec<i32> {
        self.tables
            .lock()
            .trips
            .iter()
            .filter(|trip| trip.user_id == user_id)
            .map(|trip| trip.launch_id)
            .collect()
    }

    /// Books a trip, returns `false` when it was already booked.
    pub fn book_trip(&self, user_id: i32, launch_id: i32) -> Result<bool> {
        let mut tables = self.tables.lock();
        if tables
            .trips
            .iter()
            .any(|trip| trip.user_id == user_id && trip.launch_id == launch_id)
        {
            return Ok(false);
        }
        let trip = TripRecord {
            id: tables.next_trip_id()?,
            user_id,
            launch_id,
        };
        let mut staged = tables.clone();
        staged.trips.push(trip);
        self.flush(&staged)?;
        *tables = staged;
        Ok(true)
    }

    /// Cancels a trip, returns `false` when there was nothing to cancel.
    pub fn cancel_trip(&self, user_id: i32, launch_id: i32) -> Result<bool> {
        let mut tables = self.tables.lock();
        let mut staged = tables.clone();
        staged
            .trips
            .retain(|trip| !(trip.user_id == user_id && trip.launch_id == launch_id));
        if staged.trips.len() == tables.trips.len() {
            return Ok(false);
        }
        self.flush(&staged)?;
        *tables = staged;
        Ok(true)
    }

    /// Replaces the snapshot through a sibling temporary file, the old
    /// snapshot stays intact when any step fails.
    fn flush(&self, tables: &Tables) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, tables)?;
        file.flush()?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|err| err.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_or_create_is_idempotent() {
        let store = Store::in_memory();
        let first = store.find_or_create_user("a@example.com").unwrap();
        let again = store.find_or_create_user("a@example.com").unwrap();
        let other = store.find_or_create_user("b@example.com").unwrap();

        assert_eq!(first, again);
        assert_eq!(first.id, 1);
        assert_eq!(other.id, 2);
        assert_eq!(store.find_user("b@example.com"), Some(other));
        assert_eq!(store.find_user("c@example.com"), None);
    }

    #[test]
    fn trips_keep_booking_order_and_ignore_duplicates() {
        let store = Store::in_memory();
        assert!(store.book_trip(1, 60).unwrap());
        assert!(store.book_trip(1, 12).unwrap());
        assert!(!store.book_trip(1, 60).unwrap());
        assert!(store.book_trip(2, 60).unwrap());

        assert_eq!(store.launch_ids_by_user(1), vec![60, 12]);
        assert!(store.is_booked(2, 60));
        assert!(!store.is_booked(2, 12));

        assert!(store.cancel_trip(1, 60).unwrap());
        assert!(!store.cancel_trip(1, 60).unwrap());
        assert_eq!(store.launch_ids_by_user(1), vec![12]);
    }

    #[test]
    fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = Store::open(&path).unwrap();
        let user = store.find_or_create_user("a@example.com").unwrap();
        store.book_trip(user.id, 7).unwrap();
        drop(store);

        let reopened = Store::open(&path).unwrap();
        assert_eq!(reopened.find_user("a@example.com"), Some(user.clone()));
        assert_eq!(reopened.launch_ids_by_user(user.id), vec![7]);
    }

    #[test]
    fn corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, b"not json").unwrap();

        assert!(matches!(Store::open(&path), Err(Error::Json(_))));
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("store.json");
        let store = Store::open(&path).unwrap();

        assert!(matches!(
            store.find_or_create_user("a@example.com"),
            Err(Error::StoreIo(_))
        ));
        assert!(store.find_or_create_user("a@example.com").is_err());
        assert_eq!(store.find_user("a@example.com"), None);

        assert!(store.book_trip(1, 7).is_err());
        assert!(!store.is_booked(1, 7));
        assert!(store.launch_ids_by_user(1).is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn failed_cancel_keeps_the_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let path = sub.join("store.json");

        let store = Store::open(&path).unwrap();
        store.book_trip(1, 7).unwrap();
        fs::remove_dir_all(&sub).unwrap();

        assert!(store.cancel_trip(1, 7).is_err());
        assert!(store.is_booked(1, 7));
    }

    #[test]
    fn exhausted_id_space_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(
            &path,
            r#"{"users":[{"id":2147483647,"email":"x@example.com"}],"trips":[{"id":2147483647,"userId":2147483647,"launchId":1}]}"#,
        )
        .unwrap();
        let store = Store::open(&path).unwrap();

        assert!(matches!(
            store.find_or_create_user("y@example.com"),
            Err(Error::StoreExhausted("users"))
        ));
        assert!(matches!(
            store.book_trip(i32::MAX, 2),
            Err(Error::StoreExhausted("trips"))
        ));
        assert_eq!(store.find_user("y@example.com"), None);
        assert_eq!(
            store.find_or_create_user("x@example.com").unwrap().id,
            i32::MAX
        );
    }

    #[test]
    fn flush_leaves_no_temporary_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = Store::open(&path).unwrap();
        store.find_or_create_user("a@example.com").unwrap();
        store.book_trip(1, 3).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("store.json")]);
    }
}
