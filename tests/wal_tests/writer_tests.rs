//! Tests for WAL Writer
//!
//! These tests verify:
//! - Records land in the file as text lines, in order
//! - Appending to an existing log keeps its contents
//! - Sync strategies (EveryWrite, EveryNEntries)
//! - Failed appends surface as WalWrite errors

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use titankv::config::WalSyncStrategy;
use titankv::wal::{Operation, WalReader, WalWriter};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.wal");
    (temp_dir, wal_path)
}

fn set(key: &str, value: &str) -> Operation {
    Operation::Set {
        key: key.to_string(),
        value: value.as_bytes().to_vec(),
        expires_at: None,
    }
}

// =============================================================================
// Basic Writing Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, wal_path) = setup_temp_wal();

    let writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    assert!(wal_path.exists());
    assert!(writer.is_empty());
    assert_eq!(writer.path(), wal_path.as_path());
}

#[test]
fn test_write_records_as_lines() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    writer.append(&set("a", "1")).unwrap();
    writer.append(&set("b", "two words")).unwrap();
    writer.append(&Operation::Delete { key: "a".to_string() }).unwrap();

    let contents = fs::read_to_string(&wal_path).unwrap();
    assert_eq!(contents, "SET a 1\nSET b two words\nDEL a\n");
    assert_eq!(writer.records_written(), 3);
    assert_eq!(writer.len(), contents.len() as u64);
}

#[test]
fn test_reopen_appends() {
    let (_temp, wal_path) = setup_temp_wal();

    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        writer.append(&set("a", "1")).unwrap();
    }
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        assert_eq!(writer.len(), 8);
        writer.append(&set("b", "2")).unwrap();
    }

    assert_eq!(fs::read_to_string(&wal_path).unwrap(), "SET a 1\nSET b 2\n");
}

#[test]
fn test_reopen_seals_unterminated_last_line() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, "SET a 1\nSET b").unwrap();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
    assert_eq!(writer.len(), 14);
    writer.append(&set("c", "3")).unwrap();

    assert_eq!(
        fs::read_to_string(&wal_path).unwrap(),
        "SET a 1\nSET b\nSET c 3\n"
    );
}

#[test]
fn test_reopen_leaves_terminated_log_alone() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, "SET a 1\n").unwrap();

    let writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    assert_eq!(writer.len(), 8);
    assert_eq!(fs::read_to_string(&wal_path).unwrap(), "SET a 1\n");
}

#[test]
fn test_written_records_read_back_in_order() {
    let (_temp, wal_path) = setup_temp_wal();

    let ops: Vec<Operation> = (0..50).map(|i| set(&format!("key{}", i), "v")).collect();
    {
        let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();
        for op in &ops {
            writer.append(op).unwrap();
        }
    }

    let read: Vec<Operation> = WalReader::open(&wal_path)
        .unwrap()
        .entries()
        .map(|e| e.unwrap().operation)
        .collect();
    assert_eq!(read, ops);
}

// =============================================================================
// Sync Strategy Tests
// =============================================================================

#[test]
fn test_sync_every_write() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer = WalWriter::open(&wal_path, WalSyncStrategy::EveryWrite).unwrap();

    writer.append(&set("k1", "v1")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);

    writer.append(&set("k2", "v2")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

#[test]
fn test_sync_every_n_entries() {
    let (_temp, wal_path) = setup_temp_wal();

    let mut writer =
        WalWriter::open(&wal_path, WalSyncStrategy::EveryNEntries { count: 3 }).unwrap();

    writer.append(&set("k1", "v1")).unwrap();
    assert_eq!(writer.uncommitted_count(), 1);
    writer.append(&set("k2", "v2")).unwrap();
    assert_eq!(writer.uncommitted_count(), 2);
    writer.append(&set("k3", "v3")).unwrap();
    assert_eq!(writer.uncommitted_count(), 0);

    // Unsynced records are still visible to readers
    writer.append(&set("k4", "v4")).unwrap();
    let contents = fs::read_to_string(&wal_path).unwrap();
    assert!(contents.ends_with("SET k4 v4\n"));

    writer.sync().unwrap();
    assert_eq!(writer.uncommitted_count(), 0);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[cfg(target_os = "linux")]
#[test]
fn test_append_failure_is_wal_write_error() {
    // Every write to /dev/full fails with ENOSPC
    let mut writer =
        WalWriter::open(std::path::Path::new("/dev/full"), WalSyncStrategy::EveryWrite).unwrap();

    let err = writer.append(&set("k", "v")).unwrap_err();

    assert!(err.is_durability());
    assert!(err.to_string().starts_with("WAL write failed"));
    assert_eq!(writer.records_written(), 0);
}
