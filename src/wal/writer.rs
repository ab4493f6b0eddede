//! WAL Writer
//!
//! Handles appending records to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{Result, TitanError};

use super::Operation;

/// Writes records to the WAL file
///
/// Every record is written with a single `write_all` straight to the file
/// (no userspace buffer), so a failed append never leaves bytes behind that
/// a later append would flush.
pub struct WalWriter {
    /// Log file, opened in append mode
    file: File,

    /// Path of the log file
    path: PathBuf,

    /// When to fsync
    sync_strategy: WalSyncStrategy,

    /// Length of the file after the last successful append
    len: u64,

    /// Records appended since the last fsync
    uncommitted_count: usize,

    /// Records appended by this writer
    records_written: u64,
}

impl WalWriter {
    /// Open or create a WAL file for appending
    ///
    /// A log whose last line is unterminated (a crash mid-append) gets a
    /// newline first, so the next record starts on a line of its own and
    /// only the torn line is lost.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let mut len = file.metadata().map(|m| m.len()).unwrap_or(0);

        if len > 0 && !ends_with_newline(&mut file, len)? {
            tracing::warn!(
                "WAL {} ends with an unterminated line, sealing it",
                path.display()
            );
            file.write_all(b"\n")?;
            file.sync_data()?;
            len += 1;
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
            sync_strategy,
            len,
            uncommitted_count: 0,
            records_written: 0,
        })
    }

    /// Append a record to the WAL
    ///
    /// Returns only once the record has reached the file (and, per the sync
    /// strategy, stable storage). On failure the record must be treated as
    /// not written.
    pub fn append(&mut self, operation: &Operation) -> Result<()> {
        let line = operation.encode();

        if let Err(e) = self.write_record(&line) {
            self.rollback();
            return Err(TitanError::WalWrite(e));
        }

        let should_sync = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.uncommitted_count + 1 >= count,
        };
        if should_sync {
            if let Err(e) = self.file.sync_data() {
                // The caller will not apply this record, so it must not replay either
                self.rollback();
                return Err(TitanError::WalWrite(e));
            }
            self.uncommitted_count = 0;
        } else {
            self.uncommitted_count += 1;
        }

        self.len += line.len() as u64;
        self.records_written += 1;

        Ok(())
    }

    fn write_record(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.file.write_all(line)?;
        self.file.flush()
    }

    /// Cut a torn record off the end of the file so it cannot merge with the
    /// next one
    fn rollback(&mut self) {
        let current = self.file.metadata().map(|m| m.len()).unwrap_or(self.len);
        if current > self.len {
            if let Err(e) = self.file.set_len(self.len) {
                tracing::warn!(
                    "Could not truncate torn WAL record in {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data().map_err(TitanError::WalWrite)?;
        self.uncommitted_count = 0;
        Ok(())
    }

    /// Records appended since the last fsync
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted_count
    }

    /// Records appended by this writer since it was opened
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Current length of the log in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ends_with_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
