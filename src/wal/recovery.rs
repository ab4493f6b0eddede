//! WAL Recovery
//!
//! Reads the whole WAL once at startup and hands back the records to replay.

use std::path::Path;

use crate::error::{Result, TitanError};

use super::{WalEntry, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of records successfully recovered
    pub entries_recovered: u64,

    /// Number of malformed lines skipped
    pub entries_corrupted: u64,

    /// Lines read, blank lines included
    pub lines_read: u64,
}

impl WalRecovery {
    /// Recover records from a WAL file
    ///
    /// This will:
    /// 1. Read every line in order
    /// 2. Skip malformed lines with a warning
    /// 3. Return all well-formed records in append order
    ///
    /// A malformed line never aborts recovery. I/O errors do.
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut entries = Vec::new();
        let result = Self::scan(path, |entry| entries.push(entry))?;
        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without keeping its records
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::scan(path, |_| {})
    }

    fn scan(path: &Path, mut on_entry: impl FnMut(WalEntry)) -> Result<RecoveryResult> {
        let mut reader = WalReader::open(path)?;
        let mut result = RecoveryResult::default();

        while let Some(entry) = reader.next_entry()? {
            match entry {
                Ok(entry) => {
                    result.entries_recovered += 1;
                    on_entry(entry);
                }
                Err(TitanError::WalCorruption { line, reason }) => {
                    tracing::warn!(
                        "Invalid WAL entry at {}:{} ({}), skipping",
                        path.display(),
                        line,
                        reason
                    );
                    result.entries_corrupted += 1;
                }
                Err(e) => return Err(e),
            }
        }

        result.lines_read = reader.lines_read();
        Ok(result)
    }
}
