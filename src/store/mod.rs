//! Store Module
//!
//! In-memory key -> entry mapping.
//!
//! ## Responsibilities
//! - Hold the current value and optional expiry of every key
//! - Answer "is this entry expired at time T" as a pure function
//! - Collect expired keys for the reaper
//!
//! The store itself is not synchronized. The engine owns it together with
//! the WAL writer behind a single mutex so that logging and applying a
//! mutation happen as one step.

mod table;

pub use table::Store;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time in unix milliseconds
///
/// Expiry instants are stored as wall-clock time so they stay meaningful
/// across restarts.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Absolute expiry instant for a TTL starting at `now`
pub fn expiry_after(now: u64, ttl: Duration) -> u64 {
    now.saturating_add(ttl.as_millis().min(u64::MAX as u128) as u64)
}

/// Entry stored in the Store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The stored value
    pub value: Vec<u8>,

    /// Expiry instant (unix millis). `None` never expires.
    pub expires_at: Option<u64>,
}

impl Entry {
    /// An entry that never expires
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// An entry that expires at the given unix millisecond
    pub fn with_expiry(value: Vec<u8>, expires_at: u64) -> Self {
        Self {
            value,
            expires_at: Some(expires_at),
        }
    }

    /// An entry is expired once `now` has reached its expiry instant
    pub fn is_expired_at(&self, now: u64) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }

    pub fn is_live_at(&self, now: u64) -> bool {
        !self.is_expired_at(now)
    }
}
