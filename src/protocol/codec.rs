//! Protocol codec
//!
//! Parsing and rendering for the line-oriented text protocol.
//!
//! ## Request Format
//! ```text
//! SET <key> <value...> [TTL <seconds>]\n
//! GET <key>\n
//! DEL <key>\n
//! ```
//!
//! ## Response Format
//! ```text
//! OK\n | <value>\n | NOT_FOUND\n | ERR <message>\n
//! ```

use std::io::{BufRead, Write};
use std::time::Duration;

use crate::error::{Result, TitanError};
use crate::wal::strip_line_ending;

use super::{Command, CommandType, Response, Status};

/// Largest request line accepted from a client (1 MB)
pub const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Keyword introducing the optional TTL clause of SET
pub const TTL_KEYWORD: &str = "TTL";

// =============================================================================
// Command Parsing/Encoding
// =============================================================================

/// Parse one request line into a command
///
/// The verb is case-insensitive. Trailing line terminators are ignored.
pub fn parse_command(request: &str) -> Result<Command> {
    let request = request.trim();
    if request.is_empty() {
        return Err(TitanError::protocol("empty request"));
    }

    let (verb, rest) = split_token(request);
    let command_type = CommandType::from_verb(verb).ok_or_else(|| {
        TitanError::protocol(format!("unknown command '{}'", verb.to_ascii_uppercase()))
    })?;

    match command_type {
        CommandType::Set => parse_set(rest),
        CommandType::Get => Ok(Command::Get {
            key: single_key(rest, command_type)?,
        }),
        CommandType::Del => Ok(Command::Del {
            key: single_key(rest, command_type)?,
        }),
    }
}

/// SET <key> <value...> [TTL <seconds>]
fn parse_set(args: &str) -> Result<Command> {
    let (key, rest) = split_token(args.trim_start());
    let (value, ttl) = split_ttl_clause(rest.trim());

    if key.is_empty() || value.is_empty() {
        return Err(TitanError::protocol("SET requires key and value"));
    }

    let ttl = match ttl {
        None => None,
        Some(raw) => {
            let secs: i64 = raw
                .parse()
                .map_err(|_| TitanError::protocol(format!("invalid TTL '{}'", raw)))?;
            if secs <= 0 {
                return Err(TitanError::validation(
                    "TTL must be a positive number of seconds",
                ));
            }
            Some(Duration::from_secs(secs as u64))
        }
    };

    Ok(Command::Set {
        key: key.to_string(),
        value: value.as_bytes().to_vec(),
        ttl,
    })
}

/// Split a trailing `TTL <seconds>` clause off a SET value
///
/// `TTL` only counts as the second-to-last token. Internal whitespace of the
/// value is preserved.
fn split_ttl_clause(rest: &str) -> (&str, Option<&str>) {
    let Some((head, last)) = rest.rsplit_once(char::is_whitespace) else {
        return (rest, None);
    };
    let head = head.trim_end();

    match head.rsplit_once(char::is_whitespace) {
        Some((value, marker)) if marker.eq_ignore_ascii_case(TTL_KEYWORD) => {
            (value.trim_end(), Some(last))
        }
        None if head.eq_ignore_ascii_case(TTL_KEYWORD) => ("", Some(last)),
        _ => (rest, None),
    }
}

fn single_key(args: &str, command_type: CommandType) -> Result<String> {
    let mut parts = args.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(key.to_string()),
        (None, _) => Err(TitanError::protocol(format!(
            "{} requires key",
            command_type.as_str()
        ))),
        _ => Err(TitanError::protocol(format!(
            "wrong number of arguments for '{}'",
            command_type.as_str()
        ))),
    }
}

/// Split off the first whitespace-delimited token
fn split_token(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], &s[pos..]),
        None => (s, ""),
    }
}

/// Encode a command as a request line
pub fn encode_command(command: &Command) -> String {
    match command {
        Command::Set { key, value, ttl } => {
            let value = String::from_utf8_lossy(value);
            match ttl {
                Some(ttl) => format!("SET {} {} {} {}\n", key, value, TTL_KEYWORD, ttl.as_secs()),
                None => format!("SET {} {}\n", key, value),
            }
        }
        Command::Get { key } => format!("GET {}\n", key),
        Command::Del { key } => format!("DEL {}\n", key),
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response as one newline-terminated line
pub fn encode_response(response: &Response) -> Vec<u8> {
    let mut line = Vec::new();
    match (response.status, &response.payload) {
        (Status::Ok, Some(value)) => line.extend_from_slice(value),
        (Status::Ok, None) => line.extend_from_slice(b"OK"),
        (Status::NotFound, _) => line.extend_from_slice(b"NOT_FOUND"),
        (Status::Error, message) => {
            line.extend_from_slice(b"ERR");
            if let Some(message) = message {
                line.push(b' ');
                line.extend_from_slice(message);
            }
        }
    }
    line.push(b'\n');
    line
}

/// Decode a response line
///
/// A stored value that is literally `OK`, `NOT_FOUND` or starts with `ERR `
/// is indistinguishable from the status line; the text protocol has no
/// framing to tell them apart.
pub fn decode_response(line: &[u8]) -> Response {
    let line = strip_line_ending(line);
    match line {
        b"OK" => Response::ok(None),
        b"NOT_FOUND" => Response::not_found(),
        b"ERR" => Response {
            status: Status::Error,
            payload: None,
        },
        _ if line.starts_with(b"ERR ") => Response {
            status: Status::Error,
            payload: Some(line[4..].to_vec()),
        },
        _ => Response::ok(Some(line.to_vec())),
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(encode_command(command).as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read one response line from a stream
///
/// Blocks until a complete line is received or the peer closes.
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line)?;
    if n == 0 {
        return Err(TitanError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before response",
        )));
    }
    Ok(decode_response(&line))
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}
