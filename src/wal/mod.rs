//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append a record before any mutation is applied in memory
//! - Flush every record before acknowledging it
//! - Replay the log in order on startup, skipping malformed lines
//!
//! ## File Format
//! ```text
//! SET <key> <value>
//! SETAT <key> <expires_at_unix_ms> <value>
//! DEL <key>
//! ```
//!
//! One record per line. The value is the rest of the line and may contain
//! spaces. TTLs are logged as absolute instants so that a replay after
//! downtime does not hand an expired key a fresh lease.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{strip_line_ending, Operation, WalEntry, DEL_VERB, SET_AT_VERB, SET_VERB};
pub use writer::WalWriter;
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
