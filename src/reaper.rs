//! Expiry Reaper
//!
//! Background thread that periodically removes expired entries ("active
//! expiry"), complementing the lazy eviction done by `Engine::get`.
//!
//! Without it, a key that expires and is never read again would stay in
//! memory, and in the log, forever.
//!
//! Each sweep goes through `Engine::purge_expired`, so removals are logged
//! exactly like `DEL` and survive a restart.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::engine::Engine;
use crate::error::Result;

/// Handle to the running reaper thread
///
/// Dropping the handle stops the thread and waits for it.
pub struct Reaper {
    /// Dropped or signalled to stop the loop
    stop_tx: Option<Sender<()>>,

    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Start sweeping `engine` every `interval`
    pub fn start(engine: Arc<Engine>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded(1);

        let handle = thread::Builder::new()
            .name("titankv-reaper".to_string())
            .spawn(move || reaper_loop(engine, interval, stop_rx))?;

        tracing::info!("Expiry reaper started (interval {:?})", interval);

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop the reaper and wait for the current sweep, if any, to finish
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Expiry reaper thread panicked");
            } else {
                tracing::info!("Expiry reaper stopped");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.stop();
    }
}

fn reaper_loop(engine: Arc<Engine>, interval: Duration, stop_rx: Receiver<()>) {
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                tracing::debug!("Expiry reaper received shutdown signal");
                return;
            }
        }

        let stats = engine.purge_expired();

        if stats.failed > 0 {
            tracing::warn!(
                expired = stats.expired,
                failed = stats.failed,
                "Some expired keys could not be reclaimed, retrying next cycle"
            );
        }
        if stats.purged > 0 {
            tracing::debug!(
                purged = stats.purged,
                keys_remaining = engine.size(),
                "Expired keys cleaned up"
            );
        }
    }
}
