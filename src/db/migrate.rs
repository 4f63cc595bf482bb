//! One-time import of the legacy flat JSON document.
//!
//! The legacy format is `{"year_counts": {...}, "sessions": [...]}`.
//! The import is guarded by a persisted marker in the meta table, not
//! by file existence: once the marker is set, a reappearing JSON file
//! can never double-import. The whole import (counters, sessions,
//! marker) is a single write transaction, so a crash mid-import leaves
//! the store untouched and the import re-runs cleanly.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::db::models::NewSession;
use crate::db::storage::{LabelStore, StorageResult};

/// Legacy document root
#[derive(Debug, Deserialize)]
struct LegacyDocument {
    #[serde(default)]
    year_counts: BTreeMap<String, u64>,
    #[serde(default)]
    sessions: Vec<LegacySession>,
}

/// Session entry as recorded by the legacy implementation
#[derive(Debug, Deserialize)]
struct LegacySession {
    timestamp: String,
    part_name: String,
    vendor_name: String,
    year: String,
    location: String,
    quantity: u32,
    serial_range: String,
}

/// What the import actually did.
#[derive(Debug, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Marker already set; nothing read, nothing written
    AlreadyMigrated,
    /// No legacy document on disk; marker set so we never look again
    NothingToImport,
    Imported { sessions: usize, years: usize },
}

/// Import the legacy JSON document at `path` into the store, then
/// rename the file with a `.backup` suffix.
///
/// Idempotent: safe to call on every startup.
pub fn import_legacy_json(store: &LabelStore, path: &Path) -> StorageResult<MigrationOutcome> {
    if store.is_migrated()? {
        return Ok(MigrationOutcome::AlreadyMigrated);
    }

    if !path.exists() {
        store.mark_migrated()?;
        return Ok(MigrationOutcome::NothingToImport);
    }

    let raw = std::fs::read(path)?;
    let document: LegacyDocument = serde_json::from_slice(&raw)?;

    let years = document.year_counts.len();
    let sessions = document.sessions.len();

    let txn = store.begin_write()?;
    {
        for (year, count) in &document.year_counts {
            store.set_year_count_txn(&txn, year, *count)?;
        }

        for legacy in &document.sessions {
            let session = NewSession {
                part_name: legacy.part_name.clone(),
                vendor_name: legacy.vendor_name.clone(),
                year: legacy.year.clone(),
                location: legacy.location.clone(),
                quantity: legacy.quantity,
                serial_range: legacy.serial_range.clone(),
            };
            // Keep the timestamp the legacy implementation recorded
            store.append_session_txn(&txn, &legacy.timestamp, &session)?;
        }

        store.mark_migrated_txn(&txn)?;
    }
    txn.commit()?;

    // Keep the source document around, out of the import path
    let mut backup = path.as_os_str().to_owned();
    backup.push(".backup");
    std::fs::rename(path, &backup)?;

    Ok(MigrationOutcome::Imported { sessions, years })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_JSON: &str = r#"{
        "year_counts": {"2024": 12, "2025": 3},
        "sessions": [
            {
                "timestamp": "2024-11-02T09:15:00.000000",
                "part_name": "Bracket",
                "vendor_name": "Acme",
                "year": "2024",
                "location": "WH1",
                "quantity": 12,
                "serial_range": "0001-0012"
            },
            {
                "timestamp": "2025-01-10T14:30:00.000000",
                "part_name": "Widget",
                "vendor_name": "Bolt Co",
                "year": "2025",
                "location": "WH2",
                "quantity": 3,
                "serial_range": "0001-0003"
            }
        ]
    }"#;

    fn setup() -> (tempfile::TempDir, LabelStore, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let store = LabelStore::open(dir.path().join("labels.redb")).unwrap();
        let json_path = dir.path().join("records.json");
        (dir, store, json_path)
    }

    #[test]
    fn test_import_populates_store_and_renames_file() {
        let (_dir, store, json_path) = setup();
        std::fs::write(&json_path, LEGACY_JSON).unwrap();

        let outcome = import_legacy_json(&store, &json_path).unwrap();
        assert_eq!(
            outcome,
            MigrationOutcome::Imported {
                sessions: 2,
                years: 2
            }
        );

        assert_eq!(store.get_year_count("2024").unwrap(), 12);
        assert_eq!(store.get_year_count("2025").unwrap(), 3);
        assert_eq!(store.get_total_count().unwrap(), 2);

        // Imported sessions keep their recorded timestamps
        let sessions = store.list_sessions(None, 0).unwrap();
        assert_eq!(sessions[0].timestamp, "2025-01-10T14:30:00.000000");
        assert_eq!(sessions[1].part_name, "Bracket");

        // Source renamed, not deleted
        assert!(!json_path.exists());
        let mut backup = json_path.into_os_string();
        backup.push(".backup");
        assert!(std::path::Path::new(&backup).exists());
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let (_dir, store, json_path) = setup();
        std::fs::write(&json_path, LEGACY_JSON).unwrap();

        import_legacy_json(&store, &json_path).unwrap();
        let outcome = import_legacy_json(&store, &json_path).unwrap();

        assert_eq!(outcome, MigrationOutcome::AlreadyMigrated);
        assert_eq!(store.get_year_count("2024").unwrap(), 12);
        assert_eq!(store.get_total_count().unwrap(), 2);
    }

    #[test]
    fn test_marker_beats_reappearing_file() {
        let (_dir, store, json_path) = setup();
        std::fs::write(&json_path, LEGACY_JSON).unwrap();
        import_legacy_json(&store, &json_path).unwrap();

        // Someone restores the original file from a backup
        std::fs::write(&json_path, LEGACY_JSON).unwrap();

        let outcome = import_legacy_json(&store, &json_path).unwrap();
        assert_eq!(outcome, MigrationOutcome::AlreadyMigrated);
        assert_eq!(store.get_total_count().unwrap(), 2);
        // The restored file is left alone
        assert!(json_path.exists());
    }

    #[test]
    fn test_missing_file_sets_marker() {
        let (_dir, store, json_path) = setup();

        let outcome = import_legacy_json(&store, &json_path).unwrap();
        assert_eq!(outcome, MigrationOutcome::NothingToImport);
        assert!(store.is_migrated().unwrap());
        assert_eq!(store.get_total_count().unwrap(), 0);
    }

    #[test]
    fn test_allocations_continue_after_import() {
        let (_dir, store, json_path) = setup();
        std::fs::write(&json_path, LEGACY_JSON).unwrap();
        import_legacy_json(&store, &json_path).unwrap();

        // Imported count for 2024 is 12, so the next serial is 13
        let allocation = store
            .allocate_batch("Bracket", "Acme", "2024", "WH1", 2)
            .unwrap();
        assert_eq!(allocation.range.to_string(), "0013-0014");
    }
}
