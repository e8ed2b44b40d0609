//! Counter store contract and its SQLite implementation.
//!
//! The allocator only relies on `increment_and_fetch` being atomic per
//! name. The SQLite store gets that from a single upsert statement with
//! `RETURNING`, executed under the database write lock, so separate
//! connections and separate processes sharing the file stay consistent.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use super::error::IdError;
use crate::config;
use crate::db::{self, DatabaseError};
use crate::models::CounterRecord;

/// Persistent `name -> value` mapping backing every sequence.
///
/// Implementations must make each method atomic with respect to every
/// other method on the same name, across all callers sharing the store.
pub trait CounterStore: Send + Sync {
    /// Create the counter at value 1 if absent; return it without advancing.
    fn upsert_and_get(&self, name: &str) -> Result<CounterRecord, IdError>;

    /// Create-if-absent and add one in a single atomic step.
    ///
    /// Returns the post-increment record; the value consumed by this call
    /// is `record.value - 1`.
    fn increment_and_fetch(&self, name: &str) -> Result<CounterRecord, IdError>;

    /// Read a counter without creating it.
    fn get(&self, name: &str) -> Result<Option<CounterRecord>, IdError>;

    /// All counters, ordered by name.
    fn list(&self) -> Result<Vec<CounterRecord>, IdError>;

    /// Raise the counter to at least `min_value`. Never lowers it.
    fn advance_to(&self, name: &str, min_value: u64) -> Result<CounterRecord, IdError>;
}

/// SQLite-backed counter store.
pub struct SqliteCounterStore {
    conn: Mutex<Connection>,
}

impl SqliteCounterStore {
    /// Open (or create) the counter database at `path`.
    pub fn open(path: &Path) -> Result<Self, IdError> {
        let conn = db::open_database(path, config::busy_timeout())?;
        Ok(Self::from_connection(conn))
    }

    /// Open the counter database at the configured location.
    pub fn open_default() -> Result<Self, IdError> {
        let path = config::counter_db_path();
        tracing::info!(path = %path.display(), "Opening counter store");
        Self::open(&path)
    }

    /// Private in-memory database. Not shared between stores.
    pub fn open_in_memory() -> Result<Self, IdError> {
        let conn = db::open_memory_database()?;
        Ok(Self::from_connection(conn))
    }

    /// Inspection-only view of an existing counter database.
    ///
    /// Reads succeed; every write fails with `StoreUnavailable`.
    pub fn open_read_only(path: &Path) -> Result<Self, IdError> {
        let conn = db::open_read_only_database(path, config::busy_timeout())?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection whose schema is already migrated.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, IdError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| IdError::StoreUnavailable("counter connection lock poisoned".into()))?;
        f(&conn).map_err(IdError::from)
    }
}

impl CounterStore for SqliteCounterStore {
    fn upsert_and_get(&self, name: &str) -> Result<CounterRecord, IdError> {
        self.with_conn(|conn| db::upsert_counter(conn, name))
    }

    fn increment_and_fetch(&self, name: &str) -> Result<CounterRecord, IdError> {
        self.with_conn(|conn| db::increment_counter(conn, name))
    }

    fn get(&self, name: &str) -> Result<Option<CounterRecord>, IdError> {
        self.with_conn(|conn| db::get_counter(conn, name))
    }

    fn list(&self) -> Result<Vec<CounterRecord>, IdError> {
        self.with_conn(db::list_counters)
    }

    fn advance_to(&self, name: &str, min_value: u64) -> Result<CounterRecord, IdError> {
        self.with_conn(|conn| db::advance_counter(conn, name, min_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MAX_COUNTER_VALUE;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn in_memory_database_increments() {
        let store = SqliteCounterStore::open_in_memory().unwrap();
        assert_eq!(store.increment_and_fetch("patientId").unwrap().value, 2);
        assert_eq!(store.increment_and_fetch("patientId").unwrap().value, 3);
        assert_eq!(store.get("patientId").unwrap().unwrap().value, 3);
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.db");

        {
            let store = SqliteCounterStore::open(&path).unwrap();
            for _ in 0..10 {
                store.increment_and_fetch("orderNumber").unwrap();
            }
        }

        let store = SqliteCounterStore::open(&path).unwrap();
        assert_eq!(store.get("orderNumber").unwrap().unwrap().value, 11);
        assert_eq!(store.increment_and_fetch("orderNumber").unwrap().value, 12);
    }

    #[test]
    fn separate_connections_never_share_a_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.db");
        // Migrate once up front so workers only race on counter writes
        let first = SqliteCounterStore::open(&path).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let path = path.clone();
                thread::spawn(move || {
                    let store = SqliteCounterStore::open(&path).unwrap();
                    (0..25)
                        .map(|_| store.increment_and_fetch("sampleId").unwrap().value)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let values: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let unique: HashSet<u64> = values.iter().copied().collect();
        assert_eq!(values.len(), 200);
        assert_eq!(unique.len(), 200, "Found duplicate counter values");

        assert_eq!(first.get("sampleId").unwrap().unwrap().value, 201);
    }

    #[test]
    fn shared_store_across_threads() {
        let store = Arc::new(SqliteCounterStore::open_in_memory().unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..50 {
                        store.increment_and_fetch("barcode").unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.get("barcode").unwrap().unwrap().value, 201);
    }

    #[test]
    fn read_only_store_fails_increment_without_effect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.db");
        let writer = SqliteCounterStore::open(&path).unwrap();
        writer.advance_to("reportNumber", 40).unwrap();

        let reader = SqliteCounterStore::open_read_only(&path).unwrap();
        let err = reader.increment_and_fetch("reportNumber").unwrap_err();
        assert!(matches!(err, IdError::StoreUnavailable(_)));
        assert_eq!(reader.get("reportNumber").unwrap().unwrap().value, 40);
        assert_eq!(writer.get("reportNumber").unwrap().unwrap().value, 40);
    }

    #[test]
    fn advance_to_zero_is_out_of_range() {
        let store = SqliteCounterStore::open_in_memory().unwrap();
        let err = store.advance_to("testCode", 0).unwrap_err();
        assert!(matches!(err, IdError::ValueOutOfRange(_)));
    }

    #[test]
    fn exhausted_counter_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.db");
        let store = SqliteCounterStore::open(&path).unwrap();
        store.advance_to("testCode", MAX_COUNTER_VALUE).unwrap();

        for _ in 0..2 {
            let err = store.increment_and_fetch("testCode").unwrap_err();
            assert!(matches!(err, IdError::ValueOutOfRange(_)));
        }
        assert_eq!(store.get("testCode").unwrap().unwrap().value, MAX_COUNTER_VALUE);
        assert_eq!(store.list().unwrap().len(), 1);

        let reopened = SqliteCounterStore::open(&path).unwrap();
        assert_eq!(reopened.get("testCode").unwrap().unwrap().value, MAX_COUNTER_VALUE);
        assert_eq!(reopened.increment_and_fetch("barcode").unwrap().value, 2);
    }

    #[test]
    fn advance_beyond_storable_range_is_rejected() {
        let store = SqliteCounterStore::open_in_memory().unwrap();
        let err = store.advance_to("orderNumber", MAX_COUNTER_VALUE + 1).unwrap_err();
        assert!(matches!(err, IdError::ValueOutOfRange(_)));
        assert!(store.get("orderNumber").unwrap().is_none());
    }
}
