//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{Result, TitanError};

use super::Connection;

/// TCP server for TitanKV
///
/// ## Lifecycle
/// - `start` binds synchronously (so bind errors reach the caller) and
///   spawns the listener thread
/// - `shutdown` clears the run flag and joins the listener thread, which
///   drops the listening socket on its way out
/// - connection threads notice the cleared flag on their next loop
///   iteration, at most one read timeout later
pub struct Server {
    config: Config,

    engine: Arc<Engine>,

    /// Shared by the listener and every connection thread
    running: Arc<AtomicBool>,

    /// Connections currently being served
    active_connections: Arc<AtomicUsize>,

    local_addr: Option<SocketAddr>,

    listener_thread: Option<JoinHandle<()>>,
}

impl Server {
    /// Create a new server with the given config and engine
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self {
            config,
            engine,
            running: Arc::new(AtomicBool::new(false)),
            active_connections: Arc::new(AtomicUsize::new(0)),
            local_addr: None,
            listener_thread: None,
        }
    }

    /// Bind the listen address and start accepting connections
    ///
    /// Returns the bound address (useful when listening on port 0).
    pub fn start(&mut self) -> Result<SocketAddr> {
        if self.listener_thread.is_some() {
            return Err(TitanError::Network("server is already running".to_string()));
        }
        self.config.validate()?;

        let listener = TcpListener::bind(&self.config.listen_addr).map_err(|e| {
            TitanError::Network(format!("failed to bind {}: {}", self.config.listen_addr, e))
        })?;
        // Non-blocking accept polled with a bounded sleep, so a cleared run
        // flag is seen within `accept_poll_ms`
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        self.running.store(true, Ordering::Release);

        let acceptor = Acceptor {
            config: self.config.clone(),
            engine: Arc::clone(&self.engine),
            running: Arc::clone(&self.running),
            active_connections: Arc::clone(&self.active_connections),
        };

        let spawned = thread::Builder::new()
            .name("titankv-listener".to_string())
            .spawn(move || acceptor.run(listener));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::Release);
                return Err(e.into());
            }
        };

        tracing::info!("TitanKV listening on {}", local_addr);

        self.local_addr = Some(local_addr);
        self.listener_thread = Some(handle);
        Ok(local_addr)
    }

    /// Signal the server to shutdown gracefully and wait for the listener
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);

        if let Some(handle) = self.listener_thread.take() {
            if handle.join().is_err() {
                tracing::error!("Listener thread panicked");
            }
            tracing::info!("Server stopped accepting connections");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Address the listener is bound to, once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Acquire)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// State moved into the listener thread
struct Acceptor {
    config: Config,
    engine: Arc<Engine>,
    running: Arc<AtomicBool>,
    active_connections: Arc<AtomicUsize>,
}

impl Acceptor {
    fn run(self, listener: TcpListener) {
        let poll = self.config.accept_poll();

        while self.running.load(Ordering::Acquire) {
            match listener.accept() {
                Ok((stream, addr)) => self.dispatch(stream, addr),
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(poll),
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    thread::sleep(poll);
                }
            }
        }

        // Listening socket is closed here
        drop(listener);
        tracing::debug!("Listener thread exiting");
    }

    /// Hand an accepted stream to its own thread
    fn dispatch(&self, mut stream: TcpStream, addr: SocketAddr) {
        // Some platforms hand out sockets that inherit the listener's mode
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Dropping connection from {}: {}", addr, e);
            return;
        }

        if self.active_connections.load(Ordering::Acquire) >= self.config.max_connections {
            tracing::warn!("Rejecting {}: max connections ({}) reached", addr, self.config.max_connections);
            let _ = stream.write_all(b"ERR max connections reached\n");
            return;
        }

        let slot = ConnectionSlot::acquire(Arc::clone(&self.active_connections));
        let engine = Arc::clone(&self.engine);
        let running = Arc::clone(&self.running);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        let spawned = thread::Builder::new()
            .name(format!("titankv-conn-{}", addr))
            .spawn(move || {
                let _slot = slot;
                let result = Connection::new(stream, engine, running).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.handle()
                });
                if let Err(e) = result {
                    tracing::debug!("Connection {} ended with error: {}", addr, e);
                }
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn handler for {}: {}", addr, e);
        }
    }
}

/// Counts a live connection for as long as it is held
struct ConnectionSlot {
    counter: Arc<AtomicUsize>,
}

impl ConnectionSlot {
    fn acquire(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self { counter }
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}
