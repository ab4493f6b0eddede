//! Engine Module
//!
//! The storage engine that ties the store and the WAL together.
//!
//! ## Responsibilities
//! - Validate and apply get/set/del with TTL semantics
//! - Log every mutation before applying it
//! - Replay the WAL on startup
//! - Evict expired entries, lazily on read and in bulk for the reaper

use std::fs;
use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, TitanError};
use crate::protocol::{Command, Response};
use crate::store::{expiry_after, now_millis, Entry, Store};
use crate::wal::{Operation, RecoveryResult, WalRecovery, WalWriter};

/// The main storage engine
///
/// ## Concurrency Model: one global lock
///
/// The store and the WAL writer sit behind a single mutex. Every operation,
/// reads included, takes it, so:
/// - mutations are totally ordered, in memory and in the log alike
/// - "append to WAL, then update the map" is one indivisible step
/// - a lazy eviction on `get` cannot race a concurrent `set` of the same key
///
/// Reads never run in parallel. That is the price of the above.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Store + WAL, guarded together
    state: Mutex<EngineState>,

    /// What startup replay found
    recovery: RecoveryResult,
}

struct EngineState {
    store: Store,
    wal: WalWriter,
}

impl EngineState {
    /// Log a delete, then remove the key. The key stays if logging fails.
    ///
    /// Shared by `del`, lazy eviction and the reaper.
    fn log_and_remove(&mut self, key: &str) -> Result<()> {
        self.wal.append(&Operation::Delete {
            key: key.to_string(),
        })?;
        self.store.remove(key);
        Ok(())
    }
}

/// Outcome of one reaper sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeStats {
    /// Expired entries found
    pub expired: usize,

    /// Expired entries removed (delete logged)
    pub purged: usize,

    /// Entries left in place because their delete could not be logged
    pub failed: usize,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the WAL's parent directory if needed
    /// 2. Replay the WAL if it exists, without re-logging
    /// 3. Open the WAL for appending
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let wal_path = config.wal_path.clone();

        // Step 1: Make sure the log can be created
        if let Some(parent) = wal_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Step 2: Rebuild the store from the log
        let mut store = Store::new();
        let recovery = if wal_path.is_file() {
            let (entries, result) = WalRecovery::recover(&wal_path)?;
            let now = now_millis();
            for entry in entries {
                Self::apply_unlogged(&mut store, entry.operation, now);
            }

            tracing::info!(
                "WAL recovery completed: {} operations restored, {} corrupted lines skipped, {} keys",
                result.entries_recovered,
                result.entries_corrupted,
                store.len()
            );
            result
        } else {
            RecoveryResult::default()
        };

        // Step 3: Keep the log open for appends
        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;

        Ok(Self {
            config,
            state: Mutex::new(EngineState { store, wal }),
            recovery,
        })
    }

    /// Open with a WAL path (convenience method)
    ///
    /// Uses default config with the specified WAL file
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().wal_path(path).build();
        Self::open(config)
    }

    /// Apply a replayed record without logging it again
    ///
    /// A SET whose expiry has already passed still wins over earlier records
    /// for the key, so the key ends up absent.
    fn apply_unlogged(store: &mut Store, operation: Operation, now: u64) {
        match operation {
            Operation::Set {
                key,
                value,
                expires_at: None,
            } => store.insert(key, Entry::new(value)),
            Operation::Set {
                key,
                value,
                expires_at: Some(at),
            } => {
                if at <= now {
                    store.remove(&key);
                } else {
                    store.insert(key, Entry::with_expiry(value, at));
                }
            }
            Operation::Delete { key } => {
                store.remove(&key);
            }
        }
    }

    /// Execute a command
    ///
    /// Routes commands to the matching operation. Not-found is a response,
    /// validation and WAL failures are errors.
    pub fn execute(&self, command: Command) -> Result<Response> {
        match command {
            Command::Set { key, value, ttl } => {
                self.set(&key, &value, ttl)?;
                Ok(Response::ok(None))
            }
            Command::Get { key } => Ok(match self.get(&key)? {
                Some(value) => Response::ok(Some(value)),
                None => Response::not_found(),
            }),
            Command::Del { key } => Ok(if self.del(&key)? {
                Response::ok(None)
            } else {
                Response::not_found()
            }),
        }
    }

    /// Set a key, optionally expiring after `ttl`
    ///
    /// The record is logged before the store is touched. If logging fails
    /// the previous entry (if any) is left as it was.
    pub fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        validate_key(key)?;
        validate_value(value)?;
        if ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(TitanError::validation(
                "TTL must be a positive number of seconds",
            ));
        }

        let mut state = self.state.lock();
        let expires_at = ttl.map(|ttl| expiry_after(now_millis(), ttl));

        state.wal.append(&Operation::Set {
            key: key.to_string(),
            value: value.to_vec(),
            expires_at,
        })?;

        let entry = match expires_at {
            Some(at) => Entry::with_expiry(value.to_vec(), at),
            None => Entry::new(value.to_vec()),
        };
        state.store.insert(key.to_string(), entry);

        Ok(())
    }

    /// Get a value by key
    ///
    /// Not side-effect free: an expired entry is evicted (and the eviction
    /// logged) on the way out.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut state = self.state.lock();
        let now = now_millis();

        match state.store.get(key) {
            None => return Ok(None),
            Some(entry) if entry.is_live_at(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
        }

        if let Err(e) = state.log_and_remove(key) {
            tracing::warn!("Lazy eviction of '{}' not logged, entry kept: {}", key, e);
        }
        Ok(None)
    }

    /// Delete a key
    ///
    /// Returns false for an empty or absent key. An expired entry counts as
    /// absent: it is evicted the same way `get` evicts it, and the result is
    /// false.
    pub fn del(&self, key: &str) -> Result<bool> {
        if key.is_empty() {
            return Ok(false);
        }

        let mut state = self.state.lock();
        let live = match state.store.get(key) {
            None => return Ok(false),
            Some(entry) => entry.is_live_at(now_millis()),
        };

        if !live {
            if let Err(e) = state.log_and_remove(key) {
                tracing::warn!("Lazy eviction of '{}' not logged, entry kept: {}", key, e);
            }
            return Ok(false);
        }

        state.log_and_remove(key)?;
        Ok(true)
    }

    /// Whether a live entry exists for the key. Never evicts.
    pub fn exists(&self, key: &str) -> bool {
        let state = self.state.lock();
        state
            .store
            .get(key)
            .is_some_and(|entry| entry.is_live_at(now_millis()))
    }

    /// Number of entries held, including expired ones not yet evicted
    pub fn size(&self) -> usize {
        self.state.lock().store.len()
    }

    /// All stored keys, including expired ones not yet evicted
    pub fn keys(&self) -> Vec<String> {
        self.state.lock().store.keys()
    }

    /// Approximate bytes held by keys and values
    pub fn approximate_size(&self) -> usize {
        self.state.lock().store.approximate_size()
    }

    /// Remove every expired entry, logging a delete for each
    ///
    /// Runs as one critical section. Entries whose delete cannot be logged
    /// stay put and are picked up by the next sweep or a lazy `get`.
    pub fn purge_expired(&self) -> PurgeStats {
        let mut state = self.state.lock();
        let expired = state.store.expired_keys(now_millis());

        let mut stats = PurgeStats {
            expired: expired.len(),
            ..PurgeStats::default()
        };

        for key in expired {
            match state.log_and_remove(&key) {
                Ok(()) => stats.purged += 1,
                Err(e) => {
                    tracing::warn!("Expired key '{}' not reclaimed: {}", key, e);
                    stats.failed += 1;
                }
            }
        }

        stats
    }

    /// Force the WAL to stable storage
    pub fn sync(&self) -> Result<()> {
        self.state.lock().wal.sync()
    }

    /// Close the engine gracefully
    ///
    /// Syncs the WAL; the in-memory store is dropped.
    pub fn close(self) -> Result<()> {
        self.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the WAL file path
    pub fn wal_path(&self) -> &Path {
        &self.config.wal_path
    }

    /// Records appended to the WAL since this engine was opened
    pub fn wal_records_written(&self) -> u64 {
        self.state.lock().wal.records_written()
    }

    /// What startup replay found
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Keys are non-empty and whitespace-free (both the wire and the log split
/// on whitespace)
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(TitanError::validation("key must not be empty"));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(TitanError::validation("key must not contain whitespace"));
    }
    Ok(())
}

/// Values must fit on one log line
fn validate_value(value: &[u8]) -> Result<()> {
    if value.iter().any(|&b| b == b'\n' || b == b'\r') {
        return Err(TitanError::validation("value must not contain line breaks"));
    }
    Ok(())
}
