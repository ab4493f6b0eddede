//! Configuration for TitanKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, TitanError};

/// Main configuration for a TitanKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Path of the append-only log. Replayed on open, then appended to.
    pub wal_path: PathBuf,

    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Expiry Configuration
    // -------------------------------------------------------------------------
    /// Interval between reaper sweeps (milliseconds)
    pub reaper_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Upper bound on how long the accept loop waits before re-checking
    /// the run flag (milliseconds)
    pub accept_poll_ms: u64,

    /// Connection read timeout (milliseconds). A timeout is not fatal: the
    /// handler re-checks the run flag and keeps reading.
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 for none)
    pub write_timeout_ms: u64,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// Write through to the OS on every append, fsync after N entries
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wal_path: PathBuf::from("wal.log"),
            wal_sync_strategy: WalSyncStrategy::EveryWrite,
            reaper_interval_ms: 10_000,
            listen_addr: "0.0.0.0:6380".to_string(),
            max_connections: 1024,
            accept_poll_ms: 100,
            read_timeout_ms: 1000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine and server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.wal_path.as_os_str().is_empty() {
            return Err(TitanError::Config("wal_path must not be empty".to_string()));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.wal_sync_strategy {
            return Err(TitanError::Config(
                "EveryNEntries sync count must be at least 1".to_string(),
            ));
        }
        if self.reaper_interval_ms == 0 {
            return Err(TitanError::Config("reaper_interval_ms must be positive".to_string()));
        }
        if self.max_connections == 0 {
            return Err(TitanError::Config("max_connections must be positive".to_string()));
        }
        if self.accept_poll_ms == 0 {
            return Err(TitanError::Config("accept_poll_ms must be positive".to_string()));
        }
        // Handlers only see the run flag between reads
        if self.read_timeout_ms == 0 {
            return Err(TitanError::Config("read_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_millis(self.reaper_interval_ms)
    }

    pub fn accept_poll(&self) -> Duration {
        Duration::from_millis(self.accept_poll_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the WAL file path
    pub fn wal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wal_path = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the interval between reaper sweeps (in milliseconds)
    pub fn reaper_interval_ms(mut self, ms: u64) -> Self {
        self.config.reaper_interval_ms = ms;
        self
    }

    /// Set the interval between reaper sweeps in whole seconds
    ///
    /// Saturates rather than overflowing on absurd inputs.
    pub fn reaper_interval_secs(self, secs: u64) -> Self {
        self.reaper_interval_ms(secs.saturating_mul(1000))
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the accept poll interval (in milliseconds)
    pub fn accept_poll_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
