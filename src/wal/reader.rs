//! WAL Reader
//!
//! Handles reading records from the WAL file, front to back.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;

use super::{Operation, WalEntry};

/// Reads records from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Lines consumed so far (blank lines included)
    line_no: u64,

    buf: Vec<u8>,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            line_no: 0,
            buf: Vec::new(),
        })
    }

    /// Read the next record from the WAL
    ///
    /// Returns `Ok(None)` at end of file. A malformed line comes back as
    /// `Some(Err(WalCorruption))`; the reader is positioned after it and can
    /// keep going. I/O errors come back as `Err`.
    pub fn next_entry(&mut self) -> Result<Option<Result<WalEntry>>> {
        loop {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf)?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            if super::entry::strip_line_ending(&self.buf).is_empty() {
                continue;
            }

            let line = self.line_no;
            let entry = Operation::decode(&self.buf, line).map(|operation| WalEntry { line, operation });
            return Ok(Some(entry));
        }
    }

    /// Lines consumed so far
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }

    /// Iterate over all records, malformed ones included as errors
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL records
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(entry),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                // I/O errors end iteration
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
