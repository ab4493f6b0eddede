//! Command definitions
//!
//! Represents commands from clients.

use std::time::Duration;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Set,
    Get,
    Del,
}

impl CommandType {
    /// Look up a verb, case-insensitively
    pub fn from_verb(verb: &str) -> Option<Self> {
        if verb.eq_ignore_ascii_case("SET") {
            Some(CommandType::Set)
        } else if verb.eq_ignore_ascii_case("GET") {
            Some(CommandType::Get)
        } else if verb.eq_ignore_ascii_case("DEL") {
            Some(CommandType::Del)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandType::Set => "SET",
            CommandType::Get => "GET",
            CommandType::Del => "DEL",
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Set a value, optionally expiring after `ttl`
    Set {
        key: String,
        value: Vec<u8>,
        ttl: Option<Duration>,
    },

    /// Get a value by key
    Get { key: String },

    /// Delete a key
    Del { key: String },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Set { .. } => CommandType::Set,
            Command::Get { .. } => CommandType::Get,
            Command::Del { .. } => CommandType::Del,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Command::Set { key, .. } | Command::Get { key } | Command::Del { key } => key,
        }
    }
}
