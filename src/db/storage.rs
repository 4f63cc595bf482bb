//! redb-based storage for the session log and year counters.
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `sessions` | session id | `SessionRecord` | Allocation log (append-only) |
//! | `year_counts` | year label | `u64` | Serials issued per year |
//! | `meta` | name | `u64` | Session id counter, migration marker |
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: once `commit()`
//! returns, the data survives power loss and the file is always in a
//! consistent state (copy-on-write with atomic pointer swap).
//!
//! # Isolation
//!
//! [`LabelStore::allocate_batch`] performs the read-count, append-session
//! and write-count steps inside a single write transaction. redb
//! serializes writers, so two overlapping requests for the same year can
//! never observe the same starting count.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use thiserror::Error;

use crate::db::models::{BatchAllocation, HistorySnapshot, NewSession, SessionRecord};
use crate::serial::SerialRange;

/// Session log: key = session id, value = JSON-serialized SessionRecord
const SESSIONS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("sessions");

/// Year counters: key = year label (opaque string), value = issued count
const YEAR_COUNTS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("year_counts");

/// Meta values: session id counter and migration marker
const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_SESSION_ID_KEY: &str = "next_session_id";
const MIGRATED_KEY: &str = "migrated";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Session store backed by redb
#[derive(Clone)]
pub struct LabelStore {
    db: Arc<Database>,
}

impl LabelStore {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(SESSIONS_TABLE)?;
            let _ = write_txn.open_table(YEAR_COUNTS_TABLE)?;
            let _ = write_txn.open_table(META_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction (used by the migration path to make
    /// the whole import a single commit).
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Allocation ==========

    /// Reserve a serial range for a year and persist the session record
    /// and updated counter, all in one transaction.
    ///
    /// The reserved range is `[count + 1, count + quantity]` where
    /// `count` is the year counter at transaction start. No numbers are
    /// skipped or reused; the next allocation for the same year starts
    /// right after this one.
    ///
    /// Inputs are expected pre-validated (trimmed, `quantity >= 1`);
    /// see [`crate::serial::SerialAllocator`].
    pub fn allocate_batch(
        &self,
        part_name: &str,
        vendor_name: &str,
        year: &str,
        location: &str,
        quantity: u32,
    ) -> StorageResult<BatchAllocation> {
        let txn = self.db.begin_write()?;
        let allocation = {
            let mut counts = txn.open_table(YEAR_COUNTS_TABLE)?;
            let current = counts.get(year)?.map(|g| g.value()).unwrap_or(0);
            let range = SerialRange::starting_at(current + 1, u64::from(quantity));
            let year_count = current + u64::from(quantity);
            counts.insert(year, year_count)?;
            drop(counts);

            let session = NewSession {
                part_name: part_name.to_string(),
                vendor_name: vendor_name.to_string(),
                year: year.to_string(),
                location: location.to_string(),
                quantity,
                serial_range: range.to_string(),
            };
            let session_id = self.append_session_txn(&txn, &now_iso(), &session)?;

            BatchAllocation {
                session_id,
                range,
                year_count,
            }
        };
        txn.commit()?;

        tracing::debug!(
            year,
            quantity,
            session_id = allocation.session_id,
            range = %allocation.range,
            "Allocated serial range"
        );

        Ok(allocation)
    }

    // ========== Session Operations ==========

    /// Append one session record with a server-assigned timestamp and
    /// id, in its own transaction. Returns the new id.
    pub fn create_session(&self, session: &NewSession) -> StorageResult<u64> {
        let txn = self.db.begin_write()?;
        let id = self.append_session_txn(&txn, &now_iso(), session)?;
        txn.commit()?;
        Ok(id)
    }

    /// Append a session with an explicit timestamp (within transaction).
    ///
    /// The migration path uses this to keep the timestamps recorded in
    /// the legacy document.
    pub fn append_session_txn(
        &self,
        txn: &WriteTransaction,
        timestamp: &str,
        session: &NewSession,
    ) -> StorageResult<u64> {
        let id = {
            let mut meta = txn.open_table(META_TABLE)?;
            let id = meta
                .get(NEXT_SESSION_ID_KEY)?
                .map(|g| g.value())
                .unwrap_or(1);
            meta.insert(NEXT_SESSION_ID_KEY, id + 1)?;
            id
        };

        let record = SessionRecord {
            id,
            timestamp: timestamp.to_string(),
            part_name: session.part_name.clone(),
            vendor_name: session.vendor_name.clone(),
            year: session.year.clone(),
            location: session.location.clone(),
            quantity: session.quantity,
            serial_range: session.serial_range.clone(),
        };

        let mut sessions = txn.open_table(SESSIONS_TABLE)?;
        let value = serde_json::to_vec(&record)?;
        sessions.insert(id, value.as_slice())?;
        Ok(id)
    }

    /// Sessions ordered newest first (timestamp descending, id as
    /// tiebreaker), with optional limit/offset.
    pub fn list_sessions(
        &self,
        limit: Option<usize>,
        offset: usize,
    ) -> StorageResult<Vec<SessionRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS_TABLE)?;

        let mut sessions = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let record: SessionRecord = serde_json::from_slice(value.value())?;
            sessions.push(record);
        }

        sessions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        let sessions: Vec<SessionRecord> = sessions.into_iter().skip(offset).collect();
        match limit {
            Some(n) => Ok(sessions.into_iter().take(n).collect()),
            None => Ok(sessions),
        }
    }

    /// Number of session records ever created. Counts batches, not
    /// labels: three batches of ten return 3.
    pub fn get_total_count(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SESSIONS_TABLE)?;
        Ok(table.len()?)
    }

    // ========== Year Counters ==========

    /// Current counter for a year, 0 if the year has never been seen.
    pub fn get_year_count(&self, year: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(YEAR_COUNTS_TABLE)?;
        Ok(table.get(year)?.map(|g| g.value()).unwrap_or(0))
    }

    /// Insert-or-replace the counter for a year. This overwrites
    /// unconditionally; it is NOT an increment. The allocation path
    /// never goes through here — it updates the counter inside
    /// [`allocate_batch`](Self::allocate_batch).
    pub fn set_year_count(&self, year: &str, count: u64) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        self.set_year_count_txn(&txn, year, count)?;
        txn.commit()?;
        Ok(())
    }

    /// Insert-or-replace a year counter (within transaction).
    pub fn set_year_count_txn(
        &self,
        txn: &WriteTransaction,
        year: &str,
        count: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(YEAR_COUNTS_TABLE)?;
        table.insert(year, count)?;
        Ok(())
    }

    /// Full counter snapshot in lexical key order.
    ///
    /// Years are opaque strings, so "10" sorts before "2". This matches
    /// the historical behavior and is deliberate.
    pub fn get_all_year_counts(&self) -> StorageResult<BTreeMap<String, u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(YEAR_COUNTS_TABLE)?;

        let mut counts = BTreeMap::new();
        for result in table.iter()? {
            let (key, value) = result?;
            counts.insert(key.value().to_string(), value.value());
        }
        Ok(counts)
    }

    // ========== History ==========

    /// Composite read of total count, year counters and all sessions.
    ///
    /// The three reads are separate snapshots; a writer landing between
    /// them can skew the result slightly. Acceptable under the
    /// single-writer deployment model.
    pub fn history_snapshot(&self) -> StorageResult<HistorySnapshot> {
        Ok(HistorySnapshot {
            total_count: self.get_total_count()?,
            year_counts: self.get_all_year_counts()?,
            sessions: self.list_sessions(None, 0)?,
        })
    }

    // ========== Migration Marker ==========

    /// Whether the one-time legacy import has already run.
    pub fn is_migrated(&self) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(META_TABLE)?;
        Ok(table.get(MIGRATED_KEY)?.map(|g| g.value()).unwrap_or(0) == 1)
    }

    /// Persist the migration marker (within transaction).
    pub fn mark_migrated_txn(&self, txn: &WriteTransaction) -> StorageResult<()> {
        let mut table = txn.open_table(META_TABLE)?;
        table.insert(MIGRATED_KEY, 1u64)?;
        Ok(())
    }

    /// Persist the migration marker in its own transaction.
    pub fn mark_migrated(&self) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        self.mark_migrated_txn(&txn)?;
        txn.commit()?;
        Ok(())
    }
}

/// ISO-8601 timestamp from the local clock, microsecond precision.
fn now_iso() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session(year: &str, quantity: u32, serial_range: &str) -> NewSession {
        NewSession {
            part_name: "Bracket".to_string(),
            vendor_name: "Acme".to_string(),
            year: year.to_string(),
            location: "WH1".to_string(),
            quantity,
            serial_range: serial_range.to_string(),
        }
    }

    #[test]
    fn test_allocate_batch_sequential() {
        let store = LabelStore::open_in_memory().unwrap();

        let first = store
            .allocate_batch("Bracket", "Acme", "2025", "WH1", 5)
            .unwrap();
        assert_eq!(first.range.start, 1);
        assert_eq!(first.range.end, 5);
        assert_eq!(first.range.to_string(), "0001-0005");
        assert_eq!(first.year_count, 5);

        let second = store
            .allocate_batch("Bracket", "Acme", "2025", "WH1", 3)
            .unwrap();
        assert_eq!(second.range.start, first.range.start + 5);
        assert_eq!(second.range.to_string(), "0006-0008");
        assert_eq!(second.year_count, 8);

        assert_eq!(store.get_year_count("2025").unwrap(), 8);
    }

    #[test]
    fn test_allocate_batch_years_independent() {
        let store = LabelStore::open_in_memory().unwrap();

        store
            .allocate_batch("Bracket", "Acme", "2024", "WH1", 7)
            .unwrap();
        let other = store
            .allocate_batch("Bracket", "Acme", "2025", "WH1", 2)
            .unwrap();

        // A fresh year starts at 1 regardless of other years
        assert_eq!(other.range.start, 1);
        assert_eq!(store.get_year_count("2024").unwrap(), 7);
        assert_eq!(store.get_year_count("2025").unwrap(), 2);
    }

    #[test]
    fn test_serial_field_widens_past_four_digits() {
        let store = LabelStore::open_in_memory().unwrap();
        store.set_year_count("2025", 9998).unwrap();

        let allocation = store
            .allocate_batch("Bracket", "Acme", "2025", "WH1", 3)
            .unwrap();
        assert_eq!(allocation.range.to_string(), "9999-10001");
    }

    #[test]
    fn test_total_count_counts_batches_not_labels() {
        let store = LabelStore::open_in_memory().unwrap();
        assert_eq!(store.get_total_count().unwrap(), 0);

        for _ in 0..3 {
            store
                .allocate_batch("Bracket", "Acme", "2025", "WH1", 10)
                .unwrap();
        }

        assert_eq!(store.get_total_count().unwrap(), 3);
    }

    #[test]
    fn test_year_count_defaults_to_zero() {
        let store = LabelStore::open_in_memory().unwrap();
        assert_eq!(store.get_year_count("1999").unwrap(), 0);
    }

    #[test]
    fn test_set_year_count_overwrites() {
        let store = LabelStore::open_in_memory().unwrap();

        store.set_year_count("2025", 100).unwrap();
        assert_eq!(store.get_year_count("2025").unwrap(), 100);

        // Unconditional overwrite, not an increment
        store.set_year_count("2025", 5).unwrap();
        assert_eq!(store.get_year_count("2025").unwrap(), 5);
    }

    #[test]
    fn test_all_year_counts_lexical_order() {
        let store = LabelStore::open_in_memory().unwrap();
        store.set_year_count("2", 20).unwrap();
        store.set_year_count("10", 10).unwrap();

        let counts = store.get_all_year_counts().unwrap();
        let keys: Vec<&str> = counts.keys().map(|k| k.as_str()).collect();

        // String keys: "10" sorts before "2"
        assert_eq!(keys, vec!["10", "2"]);
    }

    #[test]
    fn test_session_ids_auto_increment() {
        let store = LabelStore::open_in_memory().unwrap();

        let a = store.create_session(&test_session("2025", 1, "0001-0001")).unwrap();
        let b = store.create_session(&test_session("2025", 1, "0002-0002")).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn test_list_sessions_newest_first() {
        let store = LabelStore::open_in_memory().unwrap();

        for i in 0..3 {
            let range = format!("{:04}-{:04}", i + 1, i + 1);
            store.create_session(&test_session("2025", 1, &range)).unwrap();
        }

        let sessions = store.list_sessions(None, 0).unwrap();
        let ids: Vec<u64> = sessions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        // Timestamps must be non-increasing
        for pair in sessions.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[test]
    fn test_list_sessions_limit_offset() {
        let store = LabelStore::open_in_memory().unwrap();

        for i in 0..5 {
            let range = format!("{:04}-{:04}", i + 1, i + 1);
            store.create_session(&test_session("2025", 1, &range)).unwrap();
        }

        let limited = store.list_sessions(Some(2), 0).unwrap();
        assert_eq!(limited.iter().map(|s| s.id).collect::<Vec<_>>(), vec![5, 4]);

        let paged = store.list_sessions(Some(2), 1).unwrap();
        assert_eq!(paged.iter().map(|s| s.id).collect::<Vec<_>>(), vec![4, 3]);
    }

    #[test]
    fn test_history_snapshot() {
        let store = LabelStore::open_in_memory().unwrap();

        store
            .allocate_batch("Bracket", "Acme", "2025", "WH1", 4)
            .unwrap();
        store
            .allocate_batch("Widget", "Acme", "2024", "WH2", 2)
            .unwrap();

        let snapshot = store.history_snapshot().unwrap();
        assert_eq!(snapshot.total_count, 2);
        assert_eq!(snapshot.year_counts.get("2025"), Some(&4));
        assert_eq!(snapshot.year_counts.get("2024"), Some(&2));
        assert_eq!(snapshot.sessions.len(), 2);
        assert_eq!(snapshot.sessions[0].serial_range, "0001-0002");
    }

    #[test]
    fn test_migration_marker() {
        let store = LabelStore::open_in_memory().unwrap();
        assert!(!store.is_migrated().unwrap());

        store.mark_migrated().unwrap();
        assert!(store.is_migrated().unwrap());
    }

    #[test]
    fn test_concurrent_same_year_allocations_never_overlap() {
        let store = LabelStore::open_in_memory().unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                let mut ranges = Vec::new();
                for _ in 0..5 {
                    let allocation = store
                        .allocate_batch("Bracket", "Acme", "2025", "WH1", 3)
                        .unwrap();
                    ranges.push((allocation.range.start, allocation.range.end));
                }
                ranges
            }));
        }

        let mut all: Vec<(u64, u64)> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();

        // 20 batches of 3: contiguous, no gaps, no overlaps
        assert_eq!(all.len(), 20);
        let mut expected_start = 1;
        for (start, end) in all {
            assert_eq!(start, expected_start);
            assert_eq!(end, start + 2);
            expected_start = end + 1;
        }

        assert_eq!(store.get_year_count("2025").unwrap(), 60);
        assert_eq!(store.get_total_count().unwrap(), 20);
    }
}
