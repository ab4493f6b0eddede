//! Network Module
//!
//! The TCP front end.
//!
//! ## Threads
//! - Single listener thread (non-blocking accept, bounded poll)
//! - One thread per client connection
//! - Requests routed through `protocol::respond` to the shared Engine

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;
