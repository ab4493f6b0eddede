//! Protocol Module
//!
//! Defines the text protocol for client-server communication.
//!
//! ## Protocol Format
//!
//! One request per line, one response line per request. Verbs are
//! case-insensitive and fields are whitespace-separated.
//!
//! ### Commands
//! - `SET <key> <value...> [TTL <seconds>]`
//! - `GET <key>`
//! - `DEL <key>`
//!
//! ### Responses
//! - `OK`: SET/DEL succeeded
//! - `<value>`: GET found the key
//! - `NOT_FOUND`: GET/DEL found nothing
//! - `ERR <message>`: malformed request, validation or WAL failure

mod command;
mod response;
mod codec;
mod dispatch;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    decode_response, encode_command, encode_response, parse_command, read_response,
    write_command, write_response, MAX_REQUEST_SIZE, TTL_KEYWORD,
};
pub use dispatch::respond;
