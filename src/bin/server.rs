//! TitanKV Server Binary
//!
//! Starts the TCP server, the expiry reaper and a small admin console.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use clap::Parser;
use titankv::protocol::{encode_response, respond};
use titankv::{Config, Engine, Reaper, Server};
use tracing_subscriber::{fmt, EnvFilter};

/// TitanKV Server
#[derive(Parser, Debug)]
#[command(name = "titankv-server")]
#[command(about = "Minimal durable key-value store")]
#[command(version)]
struct Args {
    /// TCP port to listen on
    #[arg(default_value = "6380", value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// WAL file path
    #[arg(default_value = "wal.log")]
    wal_file: String,

    /// Listen host
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Seconds between expiry sweeps
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    reaper_interval_secs: u64,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,titankv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("TitanKV Server v{}", titankv::VERSION);
    tracing::info!("WAL file: {}", args.wal_file);

    // Build config from args
    let config = Config::builder()
        .wal_path(&args.wal_file)
        .listen_addr(format!("{}:{}", args.host, args.port))
        .reaper_interval_secs(args.reaper_interval_secs)
        .max_connections(args.max_connections)
        .build();

    // Open engine (replays the WAL)
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized with {} keys", engine.size());

    let mut reaper = match Reaper::start(Arc::clone(&engine), config.reaper_interval()) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to start expiry reaper: {}", e);
            std::process::exit(1);
        }
    };

    let mut server = Server::new(config, Arc::clone(&engine));
    if let Err(e) = server.start() {
        tracing::error!("Server error: {}", e);
        reaper.stop();
        std::process::exit(1);
    }

    show_help();
    run_console(&engine);

    tracing::info!("Shutting down server...");
    server.shutdown();
    reaper.stop();

    if let Err(e) = engine.sync() {
        tracing::error!("Final WAL sync failed: {}", e);
    }

    tracing::info!("Server stopped");
}

/// Admin console on stdin. Returns on `exit`/`quit` or end of input.
fn run_console(engine: &Engine) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!("titan> ");
        let _ = stdout.flush();

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Console read failed: {}", e);
                return;
            }
        }

        match line.trim() {
            "" => continue,
            "exit" | "quit" => return,
            "help" => show_help(),
            "stats" => show_stats(engine),
            request => {
                // Anything else is run as a protocol request
                let response = respond(engine, request);
                let _ = stdout.write_all(&encode_response(&response));
            }
        }
    }
}

fn show_help() {
    println!("TitanKV - Simple Key-Value Store");
    println!("Usage: titankv-server [PORT] [WAL_FILE]");
    println!();
    println!("Commands:");
    println!("  SET <key> <value> [TTL <seconds>] - Store a key-value pair");
    println!("  GET <key>                         - Retrieve a value");
    println!("  DEL <key>                         - Delete a key");
    println!();
    println!("Interactive commands:");
    println!("  help                              - Show this help");
    println!("  stats                             - Show store statistics");
    println!("  exit                              - Stop the server");
}

fn show_stats(engine: &Engine) {
    let recovery = engine.recovery();
    println!("Store Statistics:");
    println!("  Total keys: {}", engine.size());
    println!("  Approximate data size: {} bytes", engine.approximate_size());
    println!("  WAL records written: {}", engine.wal_records_written());
    println!(
        "  Recovered at startup: {} operations ({} corrupted lines skipped)",
        recovery.entries_recovered, recovery.entries_corrupted
    );
}
