//! Client Connection
//!
//! Serves one client: request lines in, response lines out.

use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{Result, TitanError};
use crate::protocol::{respond, write_response, Response, MAX_REQUEST_SIZE};
use crate::wal::strip_line_ending;

/// One client session, run on its own thread
pub struct Connection {
    /// Inbound half; holds any partially received request
    reader: BufReader<TcpStream>,

    /// Outbound half; flushed after every response
    writer: BufWriter<TcpStream>,

    engine: Arc<Engine>,

    /// Server run flag; the handler exits once it is cleared
    running: Arc<AtomicBool>,

    /// `ip:port` of the client, or "unknown"
    peer_addr: String,
}

impl Connection {
    /// Wrap an accepted stream
    pub fn new(stream: TcpStream, engine: Arc<Engine>, running: Arc<AtomicBool>) -> Result<Self> {
        let peer_addr = match stream.peer_addr() {
            Ok(addr) => addr.to_string(),
            Err(_) => "unknown".to_string(),
        };

        // Responses are single short lines; don't let Nagle hold them back
        stream.set_nodelay(true)?;

        let inbound = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(inbound),
            writer: BufWriter::new(stream),
            engine,
            running,
            peer_addr,
        })
    }

    /// Apply socket timeouts in milliseconds (0 leaves a timeout unset)
    ///
    /// The read timeout bounds how long a handler blocked on an idle client
    /// takes to notice shutdown.
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let as_timeout = |ms: u64| (ms > 0).then(|| Duration::from_millis(ms));

        if let Some(timeout) = as_timeout(read_ms) {
            self.reader.get_ref().set_read_timeout(Some(timeout))?;
        }
        if let Some(timeout) = as_timeout(write_ms) {
            self.writer.get_ref().set_write_timeout(Some(timeout))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads request lines in a loop and sends one response per line.
    /// Returns when the client disconnects, the server shuts down, or a
    /// non-transient I/O error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Serving client {}", self.peer_addr);

        // Survives transient read errors so a partial line is not lost
        let mut line = Vec::new();

        while self.running.load(Ordering::Acquire) {
            let limit = (MAX_REQUEST_SIZE + 1).saturating_sub(line.len()) as u64;
            let read = self.reader.by_ref().take(limit).read_until(b'\n', &mut line);

            match read {
                Ok(0) if line.is_empty() => {
                    tracing::debug!("Client {} closed the connection", self.peer_addr);
                    return Ok(());
                }
                Ok(_) => {}
                Err(ref e) if is_transient(e) => continue,
                Err(ref e) if is_disconnect(e) => {
                    tracing::debug!("Connection to {} closed: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Read from {} failed: {}", self.peer_addr, e);
                    return Err(e.into());
                }
            }

            if line.len() > MAX_REQUEST_SIZE {
                tracing::warn!("Request from {} exceeds {} bytes", self.peer_addr, MAX_REQUEST_SIZE);
                let _ = self.send_response(&Response::error("request too large"));
                return Ok(());
            }

            let request = String::from_utf8_lossy(strip_line_ending(&line)).into_owned();
            line.clear();

            if request.is_empty() {
                continue;
            }

            tracing::trace!("Received request from {}: {}", self.peer_addr, request);

            let response = respond(&self.engine, &request);

            if let Err(e) = self.send_response(&response) {
                // A client that hung up mid-request is not a server error
                if let TitanError::Io(ref io_err) = e {
                    if is_disconnect(io_err) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Write to {} failed: {}", self.peer_addr, e);
                return Err(e);
            }
        }

        tracing::debug!("Closing connection to {} for shutdown", self.peer_addr);
        Ok(())
    }

    fn send_response(&mut self, response: &Response) -> Result<()> {
        write_response(&mut self.writer, response)
    }
}

/// Read timeouts surface as WouldBlock (Unix) or TimedOut (Windows)
fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
    )
}

fn is_disconnect(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
    )
}
