//! Error types for TitanKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using TitanError
pub type Result<T> = std::result::Result<T, TitanError>;

/// Unified error type for TitanKV operations
#[derive(Debug, Error)]
pub enum TitanError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    /// A log line that could not be parsed. Skipped during replay.
    #[error("WAL corruption at line {line}: {reason}")]
    WalCorruption { line: u64, reason: String },

    /// Append or flush failed; the mutation was not applied.
    #[error("WAL write failed: {0}")]
    WalWrite(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TitanError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        TitanError::Validation(message.into())
    }

    /// Shorthand for a malformed request
    pub fn protocol(message: impl Into<String>) -> Self {
        TitanError::Protocol(message.into())
    }

    /// True for failures that left the store untouched because the log write failed
    pub fn is_durability(&self) -> bool {
        matches!(self, TitanError::WalWrite(_))
    }
}
