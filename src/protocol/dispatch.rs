//! Request dispatch
//!
//! Turns one request line into one response. Errors never escape: parse
//! failures, validation failures and WAL failures all become `ERR` lines.

use crate::engine::Engine;

use super::{parse_command, Response};

/// Parse, execute and render a single request
pub fn respond(engine: &Engine, request: &str) -> Response {
    let command = match parse_command(request) {
        Ok(command) => command,
        Err(e) => return Response::error(&e.to_string()),
    };

    tracing::trace!("Executing {:?} on '{}'", command.command_type(), command.key());

    match engine.execute(command) {
        Ok(response) => response,
        Err(e) => {
            if e.is_durability() {
                tracing::warn!("Request failed, mutation not applied: {}", e);
            }
            Response::error(&e.to_string())
        }
    }
}
