//! # TitanKV
//!
//! A minimal durable key-value store with:
//! - Write-Ahead Logging (WAL) for durability
//! - Crash recovery that skips corrupted log lines
//! - TTL expiry, both lazy (on read) and active (background reaper)
//! - Line-oriented text protocol over TCP
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (listener thread + thread per client)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  request line
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Command Parser                             │
//! │                (stateless, text in/out)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │◄── Reaper
//! │                  (one global Mutex)                          │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │ 1. append                    │ 2. apply
//!            ▼                              ▼
//!     ┌─────────────┐               ┌─────────────┐
//!     │     WAL     │               │    Store    │
//!     │  (Append)   │               │  (HashMap)  │
//!     └─────────────┘               └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod store;
pub mod engine;
pub mod reaper;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, TitanError};
pub use config::Config;
pub use engine::{Engine, PurgeStats};
pub use reaper::Reaper;
pub use network::Server;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of TitanKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
