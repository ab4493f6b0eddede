//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log records and their text form.

use crate::error::{Result, TitanError};

/// Verb for an immortal upsert
pub const SET_VERB: &str = "SET";

/// Verb for an upsert carrying an absolute expiry instant
pub const SET_AT_VERB: &str = "SETAT";

/// Verb for a removal
pub const DEL_VERB: &str = "DEL";

/// A single record read back from the WAL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalEntry {
    /// 1-based line number in the log file
    pub line: u64,

    /// The operation to replay
    pub operation: Operation,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Upsert a key. `expires_at` is unix millis.
    Set {
        key: String,
        value: Vec<u8>,
        expires_at: Option<u64>,
    },

    /// Delete a key
    Delete { key: String },
}

impl Operation {
    /// The key this operation touches
    pub fn key(&self) -> &str {
        match self {
            Operation::Set { key, .. } | Operation::Delete { key } => key,
        }
    }

    /// Encode as one newline-terminated log line
    ///
    /// ```text
    /// SET <key> <value>
    /// SETAT <key> <expires_at_ms> <value>
    /// DEL <key>
    /// ```
    pub fn encode(&self) -> Vec<u8> {
        let mut line = Vec::new();
        match self {
            Operation::Set {
                key,
                value,
                expires_at: None,
            } => {
                line.extend_from_slice(SET_VERB.as_bytes());
                line.push(b' ');
                line.extend_from_slice(key.as_bytes());
                line.push(b' ');
                line.extend_from_slice(value);
            }
            Operation::Set {
                key,
                value,
                expires_at: Some(at),
            } => {
                line.extend_from_slice(SET_AT_VERB.as_bytes());
                line.push(b' ');
                line.extend_from_slice(key.as_bytes());
                line.push(b' ');
                line.extend_from_slice(at.to_string().as_bytes());
                line.push(b' ');
                line.extend_from_slice(value);
            }
            Operation::Delete { key } => {
                line.extend_from_slice(DEL_VERB.as_bytes());
                line.push(b' ');
                line.extend_from_slice(key.as_bytes());
            }
        }
        line.push(b'\n');
        line
    }

    /// Decode one log line (trailing `\r`/`\n` allowed)
    ///
    /// `line_no` is only used for error reporting.
    pub fn decode(line: &[u8], line_no: u64) -> Result<Self> {
        let corrupt = |reason: &str| TitanError::WalCorruption {
            line: line_no,
            reason: reason.to_string(),
        };

        let line = strip_line_ending(line);
        let (verb, args) = split_once_space(line).ok_or_else(|| corrupt("missing separator"))?;

        match verb {
            b"SET" => {
                let (key, value) =
                    split_once_space(args).ok_or_else(|| corrupt("SET requires key and value"))?;
                Ok(Operation::Set {
                    key: decode_key(key).map_err(|r| corrupt(r))?,
                    value: value.to_vec(),
                    expires_at: None,
                })
            }
            b"SETAT" => {
                let (key, rest) =
                    split_once_space(args).ok_or_else(|| corrupt("SETAT requires key"))?;
                let (at, value) = split_once_space(rest)
                    .ok_or_else(|| corrupt("SETAT requires expiry and value"))?;
                let at = std::str::from_utf8(at)
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .ok_or_else(|| corrupt("invalid expiry instant"))?;
                Ok(Operation::Set {
                    key: decode_key(key).map_err(|r| corrupt(r))?,
                    value: value.to_vec(),
                    expires_at: Some(at),
                })
            }
            b"DEL" => Ok(Operation::Delete {
                key: decode_key(args).map_err(|r| corrupt(r))?,
            }),
            _ => Err(corrupt(&format!(
                "unknown command '{}'",
                String::from_utf8_lossy(verb)
            ))),
        }
    }
}

/// Strip any trailing `\r` and `\n` bytes
pub fn strip_line_ending(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    &line[..end]
}

fn split_once_space(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = bytes.iter().position(|&b| b == b' ')?;
    Some((&bytes[..pos], &bytes[pos + 1..]))
}

fn decode_key(bytes: &[u8]) -> std::result::Result<String, &'static str> {
    if bytes.is_empty() {
        return Err("empty key");
    }
    let key = std::str::from_utf8(bytes).map_err(|_| "key is not valid UTF-8")?;
    if key.chars().any(char::is_whitespace) {
        return Err("key contains whitespace");
    }
    Ok(key.to_string())
}
