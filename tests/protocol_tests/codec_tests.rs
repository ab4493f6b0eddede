//! Codec Tests
//!
//! Tests for request parsing, response rendering and dispatch.

use std::io::Cursor;
use std::time::Duration;

use tempfile::TempDir;
use titankv::protocol::{
    decode_response, encode_command, encode_response, parse_command, read_response, respond,
    write_response, Command, CommandType, Response, Status,
};
use titankv::{Engine, TitanError};

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open_path(&temp_dir.path().join("wal.log")).unwrap();
    (temp_dir, engine)
}

fn reply(engine: &Engine, request: &str) -> String {
    String::from_utf8(encode_response(&respond(engine, request))).unwrap()
}

// =============================================================================
// Request Parsing Tests
// =============================================================================

#[test]
fn test_parse_get_and_del() {
    assert_eq!(
        parse_command("GET foo").unwrap(),
        Command::Get {
            key: "foo".to_string()
        }
    );
    assert_eq!(
        parse_command("DEL foo").unwrap(),
        Command::Del {
            key: "foo".to_string()
        }
    );
}

#[test]
fn test_parse_verb_is_case_insensitive() {
    assert_eq!(
        parse_command("get foo").unwrap().command_type(),
        CommandType::Get
    );
    assert_eq!(
        parse_command("sEt foo bar").unwrap().command_type(),
        CommandType::Set
    );
}

#[test]
fn test_parse_set_value_keeps_internal_spaces() {
    assert_eq!(
        parse_command("SET  greeting   hello   big world  \r\n").unwrap(),
        Command::Set {
            key: "greeting".to_string(),
            value: b"hello   big world".to_vec(),
            ttl: None,
        }
    );
}

#[test]
fn test_parse_set_with_ttl() {
    assert_eq!(
        parse_command("SET foo bar baz ttl 10").unwrap(),
        Command::Set {
            key: "foo".to_string(),
            value: b"bar baz".to_vec(),
            ttl: Some(Duration::from_secs(10)),
        }
    );
}

#[test]
fn test_parse_ttl_word_elsewhere_is_value() {
    assert_eq!(
        parse_command("SET foo TTL means time to live").unwrap(),
        Command::Set {
            key: "foo".to_string(),
            value: b"TTL means time to live".to_vec(),
            ttl: None,
        }
    );
}

#[test]
fn test_parse_set_missing_value() {
    assert!(matches!(
        parse_command("SET foo"),
        Err(TitanError::Protocol(_))
    ));
    assert!(matches!(
        parse_command("SET foo TTL 5"),
        Err(TitanError::Protocol(_))
    ));
    assert!(matches!(parse_command("SET"), Err(TitanError::Protocol(_))));
}

#[test]
fn test_parse_bad_ttl() {
    let err = parse_command("SET foo bar TTL soon").unwrap_err();
    assert_eq!(err.to_string(), "invalid TTL 'soon'");

    for request in ["SET foo bar TTL 0", "SET foo bar TTL -3"] {
        assert!(matches!(
            parse_command(request),
            Err(TitanError::Validation(_))
        ));
    }
}

#[test]
fn test_parse_wrong_arity() {
    assert_eq!(
        parse_command("GET").unwrap_err().to_string(),
        "GET requires key"
    );
    assert_eq!(
        parse_command("DEL a b").unwrap_err().to_string(),
        "wrong number of arguments for 'DEL'"
    );
}

#[test]
fn test_parse_unknown_command() {
    assert_eq!(
        parse_command("flush all").unwrap_err().to_string(),
        "unknown command 'FLUSH'"
    );
    assert!(parse_command("   ").is_err());
}

#[test]
fn test_encode_command() {
    let set = Command::Set {
        key: "k".to_string(),
        value: b"v w".to_vec(),
        ttl: Some(Duration::from_secs(30)),
    };
    assert_eq!(encode_command(&set), "SET k v w TTL 30\n");
    assert_eq!(parse_command(&encode_command(&set)).unwrap(), set);

    assert_eq!(
        encode_command(&Command::Get {
            key: "k".to_string()
        }),
        "GET k\n"
    );
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_encode_response_lines() {
    assert_eq!(encode_response(&Response::ok(None)), b"OK\n".to_vec());
    assert_eq!(
        encode_response(&Response::ok(Some(b"bar".to_vec()))),
        b"bar\n".to_vec()
    );
    assert_eq!(
        encode_response(&Response::not_found()),
        b"NOT_FOUND\n".to_vec()
    );
    assert_eq!(
        encode_response(&Response::error("boom")),
        b"ERR boom\n".to_vec()
    );
}

#[test]
fn test_decode_response_lines() {
    assert_eq!(decode_response(b"OK\n"), Response::ok(None));
    assert_eq!(decode_response(b"NOT_FOUND\r\n"), Response::not_found());
    assert_eq!(
        decode_response(b"some value\n"),
        Response::ok(Some(b"some value".to_vec()))
    );

    let err = decode_response(b"ERR bad thing\n");
    assert_eq!(err.status, Status::Error);
    assert_eq!(err.error_message().as_deref(), Some("bad thing"));
}

#[test]
fn test_stream_helpers() {
    let mut buf = Vec::new();
    write_response(&mut buf, &Response::ok(Some(b"v".to_vec()))).unwrap();
    write_response(&mut buf, &Response::not_found()).unwrap();

    let mut reader = Cursor::new(buf);
    assert_eq!(
        read_response(&mut reader).unwrap(),
        Response::ok(Some(b"v".to_vec()))
    );
    assert_eq!(read_response(&mut reader).unwrap(), Response::not_found());
    assert!(read_response(&mut reader).is_err());
}

// =============================================================================
// Dispatch Tests (literal request/response pairs)
// =============================================================================

#[test]
fn test_respond_set_get_del() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(reply(&engine, "SET foo bar"), "OK\n");
    assert_eq!(reply(&engine, "GET foo"), "bar\n");
    assert_eq!(reply(&engine, "DEL foo"), "OK\n");
    assert_eq!(reply(&engine, "GET foo"), "NOT_FOUND\n");
    assert_eq!(reply(&engine, "DEL missing"), "NOT_FOUND\n");
}

#[test]
fn test_respond_errors() {
    let (_temp, engine) = setup_temp_engine();

    assert!(reply(&engine, "SET \"\"").starts_with("ERR "));
    assert_eq!(
        reply(&engine, "INCR counter"),
        "ERR unknown command 'INCR'\n"
    );
    assert_eq!(
        reply(&engine, "SET foo bar TTL 0"),
        "ERR TTL must be a positive number of seconds\n"
    );
    assert_eq!(engine.size(), 0);
}

#[test]
fn test_respond_ttl_expiry() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(reply(&engine, "SET foo bar TTL 1"), "OK\n");
    assert_eq!(reply(&engine, "GET foo"), "bar\n");

    std::thread::sleep(Duration::from_millis(1100));

    assert_eq!(reply(&engine, "GET foo"), "NOT_FOUND\n");
}
