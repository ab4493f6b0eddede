//! TitanKV CLI Client
//!
//! Command-line interface for interacting with TitanKV.

use std::io::{BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use titankv::protocol::{read_response, write_command, Command, Response, Status};

/// TitanKV CLI
#[derive(Parser, Debug)]
#[command(name = "titankv-cli")]
#[command(about = "CLI for TitanKV key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6380")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set (words are joined with single spaces)
        #[arg(required = true, num_args = 1..)]
        value: Vec<String>,

        /// Expire the key after this many seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        ttl: Option<u64>,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Send a raw request line
    Raw {
        /// Request words, e.g. `SET foo bar TTL 5`
        #[arg(required = true, num_args = 1..)]
        request: Vec<String>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(response) => print_response(&response),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> titankv::Result<Response> {
    let stream = TcpStream::connect(&args.server)?;
    stream.set_read_timeout(Some(Duration::from_secs(10)))?;

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    match args.command {
        Commands::Get { key } => write_command(&mut writer, &Command::Get { key })?,
        Commands::Set { key, value, ttl } => write_command(
            &mut writer,
            &Command::Set {
                key,
                value: value.join(" ").into_bytes(),
                ttl: ttl.map(Duration::from_secs),
            },
        )?,
        Commands::Del { key } => write_command(&mut writer, &Command::Del { key })?,
        Commands::Raw { request } => {
            writer.write_all(request.join(" ").as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
    }

    read_response(&mut reader)
}

fn print_response(response: &Response) -> ExitCode {
    match (response.status, &response.payload) {
        (Status::Ok, Some(value)) => {
            println!("{}", String::from_utf8_lossy(value));
            ExitCode::SUCCESS
        }
        (Status::Ok, None) => {
            println!("OK");
            ExitCode::SUCCESS
        }
        (Status::NotFound, _) => {
            println!("NOT_FOUND");
            ExitCode::SUCCESS
        }
        (Status::Error, _) => {
            eprintln!("ERR {}", response.error_message().unwrap_or_default());
            ExitCode::FAILURE
        }
    }
}
