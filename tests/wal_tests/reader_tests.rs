//! Tests for WAL Reader
//!
//! These tests verify:
//! - Reading records from a WAL file front to back
//! - Iterator functionality
//! - Malformed lines are reported without ending the read
//! - Empty file and blank line handling

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use titankv::wal::{Operation, WalEntry, WalReader};
use titankv::TitanError;

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
// Basic Reading Tests
// =============================================================================

#[test]
fn test_read_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"").unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();

    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.lines_read(), 0);
}

#[test]
fn test_read_single_entry() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"SET key1 value1\n").unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();

    let entry = reader.next_entry().unwrap().unwrap().unwrap();
    assert_eq!(
        entry,
        WalEntry {
            line: 1,
            operation: set("key1", "value1"),
        }
    );
    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn test_read_multiple_entries() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"SET a 1\nSETAT b 5000 2\nDEL a\n").unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();

    let first = reader.next_entry().unwrap().unwrap().unwrap();
    assert_eq!(first.operation, set("a", "1"));

    let second = reader.next_entry().unwrap().unwrap().unwrap();
    assert_eq!(
        second.operation,
        Operation::Set {
            key: "b".to_string(),
            value: b"2".to_vec(),
            expires_at: Some(5000),
        }
    );

    let third = reader.next_entry().unwrap().unwrap().unwrap();
    assert_eq!(
        third.operation,
        Operation::Delete {
            key: "a".to_string()
        }
    );
    assert_eq!(third.line, 3);

    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.lines_read(), 3);
}

#[test]
fn test_read_missing_file_is_error() {
    let (_temp, wal_path) = setup_temp_wal();

    assert!(matches!(WalReader::open(&wal_path), Err(TitanError::Io(_))));
}

// =============================================================================
// Iterator Tests
// =============================================================================

#[test]
fn test_iterator_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"").unwrap();

    let reader = WalReader::open(&wal_path).unwrap();

    assert_eq!(reader.entries().count(), 0);
}

#[test]
fn test_iterator_for_loop() {
    let (_temp, wal_path) = setup_temp_wal();
    let mut contents = Vec::new();
    for i in 0..10 {
        contents.extend(set(&format!("key{}", i), &format!("value {}", i)).encode());
    }
    fs::write(&wal_path, &contents).unwrap();

    let reader = WalReader::open(&wal_path).unwrap();
    let mut count = 0;
    for (i, entry) in reader.entries().enumerate() {
        let entry = entry.unwrap();
        assert_eq!(entry.line, i as u64 + 1);
        assert_eq!(entry.operation, set(&format!("key{}", i), &format!("value {}", i)));
        count += 1;
    }

    assert_eq!(count, 10);
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_malformed_line_is_reported_and_skipped() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"SET a 1\nGARBAGE\nSET b 2\n").unwrap();

    let results: Vec<_> = WalReader::open(&wal_path).unwrap().entries().collect();

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(TitanError::WalCorruption { line: 2, .. })
    ));
    assert_eq!(results[2].as_ref().unwrap().operation, set("b", "2"));
}

#[test]
fn test_torn_final_line() {
    let (_temp, wal_path) = setup_temp_wal();
    // Crash mid-append: the last record lost its value and newline
    fs::write(&wal_path, b"SET a 1\nSET b").unwrap();

    let results: Vec<_> = WalReader::open(&wal_path).unwrap().entries().collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn test_blank_lines_are_skipped_but_counted() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"\nSET a 1\r\n\n\nDEL a\n").unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();

    let first = reader.next_entry().unwrap().unwrap().unwrap();
    assert_eq!(first.line, 2);
    assert_eq!(first.operation, set("a", "1"));

    let second = reader.next_entry().unwrap().unwrap().unwrap();
    assert_eq!(second.line, 5);

    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.lines_read(), 5);
}

#[test]
fn test_large_entry() {
    let (_temp, wal_path) = setup_temp_wal();
    let big = "x".repeat(256 * 1024);
    fs::write(&wal_path, set("big", &big).encode()).unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();
    let entry = reader.next_entry().unwrap().unwrap().unwrap();

    assert_eq!(entry.operation, set("big", &big));
}
